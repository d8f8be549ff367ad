//! Reporting on recorded latency and token usage.

use std::path::Path;

use anyhow::{Context, Result};

use crate::observability::{clear_snapshot, load_snapshot, MonitoringSnapshot};

pub fn run(stats_path: &Path, reset: bool) -> Result<()> {
    if reset {
        clear_snapshot(stats_path).context("Failed to reset monitoring data")?;
        println!("Monitoring data reset");
        return Ok(());
    }

    let snapshot = load_snapshot(stats_path)
        .with_context(|| format!("Failed to read {}", stats_path.display()))?;
    print!("{}", render(&snapshot));
    Ok(())
}

pub fn render(snapshot: &MonitoringSnapshot) -> String {
    if snapshot.is_empty() {
        return "No monitoring data recorded yet\n".to_string();
    }

    let mut out = String::new();
    if let Some(updated_at) = &snapshot.updated_at {
        out.push_str(&format!("Updated: {}\n", updated_at));
    }

    out.push_str("\nLatency (seconds)\n");
    out.push_str(&format!(
        "{:<24} {:>6} {:>9} {:>9} {:>9} {:>9}\n",
        "operation", "count", "mean", "median", "min", "max"
    ));
    for (op, stats) in snapshot.latency_stats() {
        out.push_str(&format!(
            "{:<24} {:>6} {:>9.4} {:>9.4} {:>9.4} {:>9.4}\n",
            op, stats.count, stats.mean, stats.median, stats.min, stats.max
        ));
    }

    if !snapshot.token_usage.is_empty() {
        out.push_str("\nToken usage\n");
        for (op, usage) in &snapshot.token_usage {
            for (key, count) in usage {
                out.push_str(&format!("{:<24} {:<32} {:>10}\n", op, key, count));
            }
            for model in usage.keys().filter_map(|k| k.strip_suffix("_total")) {
                let cost = snapshot.estimate_cost(op, model);
                out.push_str(&format!(
                    "{:<24} {:<32} {:>10.6}\n",
                    op,
                    format!("{}_cost_usd", model),
                    cost
                ));
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::Observability;
    use std::time::Duration;

    #[test]
    fn empty_snapshot_renders_notice() {
        assert!(render(&MonitoringSnapshot::default()).contains("No monitoring data"));
    }

    #[test]
    fn render_lists_operations_and_tokens() {
        let obs = Observability::new();
        obs.record("retrieval.hybrid", Duration::from_millis(20), true);
        obs.record_tokens("generation", "gpt-4o-mini", 1000, 1000);

        let text = render(&obs.snapshot());

        assert!(text.contains("retrieval.hybrid"));
        assert!(text.contains("gpt-4o-mini_total"));
        assert!(text.contains("gpt-4o-mini_cost_usd"));
    }

    #[test]
    fn reset_removes_saved_stats() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.json");
        let obs = Observability::new();
        obs.record("generation", Duration::from_millis(5), true);
        obs.save_snapshot(&path).unwrap();

        run(&path, true).unwrap();

        assert!(load_snapshot(&path).unwrap().is_empty());
        run(&path, false).unwrap();
    }
}
