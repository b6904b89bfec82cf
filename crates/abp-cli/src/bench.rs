use std::cmp::Ordering;
use std::time::Instant;

use abp_core::matcher::Matcher;
use abp_core::query::Query;

pub struct BenchOptions {
    pub iterations: usize,
    pub warmup: usize,
}

struct BenchResult {
    batches: usize,
    queries: usize,
    matches: usize,
    total_ms: f64,
    avg_us: f64,
    p50_ms: f64,
    p95_ms: f64,
    p99_ms: f64,
    queries_per_sec: u64,
}

/// Time `match_all` over the whole URI batch, `iterations` times.
pub fn run(matcher: &Matcher, uris: &[String], opts: &BenchOptions) -> Result<(), String> {
    if uris.is_empty() {
        return Err("No URIs to benchmark".to_string());
    }

    let queries: Vec<Query> = uris.iter().map(|uri| Query::new(uri.as_str())).collect();

    println!("============================================================");
    println!("abpvm Benchmark");
    println!("============================================================");
    println!("Rules:      {}", matcher.len());
    println!("Queries:    {}", queries.len());
    println!("Iterations: {}", opts.iterations);
    println!();

    println!("Warmup...");
    for _ in 0..opts.warmup {
        let _ = matcher.match_all(&queries);
    }

    let result = run_batches(matcher, &queries, opts.iterations.max(1));
    println!("{}", format_result(&result));

    Ok(())
}

fn run_batches(matcher: &Matcher, queries: &[Query], iterations: usize) -> BenchResult {
    let mut samples_ms = Vec::with_capacity(iterations);
    let mut matches = 0usize;

    let start = Instant::now();
    for _ in 0..iterations {
        let batch_start = Instant::now();
        matches = matcher.match_all(queries).len();
        samples_ms.push(batch_start.elapsed().as_secs_f64() * 1000.0);
    }
    let total_ms = start.elapsed().as_secs_f64() * 1000.0;

    samples_ms.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

    let total_queries = queries.len() * iterations;
    BenchResult {
        batches: iterations,
        queries: total_queries,
        matches,
        total_ms,
        avg_us: if total_queries == 0 { 0.0 } else { total_ms * 1000.0 / total_queries as f64 },
        p50_ms: percentile(&samples_ms, 0.50),
        p95_ms: percentile(&samples_ms, 0.95),
        p99_ms: percentile(&samples_ms, 0.99),
        queries_per_sec: if total_ms > 0.0 { (total_queries as f64 / (total_ms / 1000.0)) as u64 } else { 0 },
    }
}

fn format_result(result: &BenchResult) -> String {
    format!(
        "match_all:\n  Batches: {}\n  Queries: {}\n  Matches per batch: {}\n  Total: {:.2} ms\n  Avg: {:.2} us/query\n  Batch P50: {:.3} ms\n  Batch P95: {:.3} ms\n  Batch P99: {:.3} ms\n  Throughput: {} queries/sec",
        result.batches,
        result.queries,
        result.matches,
        result.total_ms,
        result.avg_us,
        result.p50_ms,
        result.p95_ms,
        result.p99_ms,
        result.queries_per_sec,
    )
}

fn percentile(values: &[f64], p: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let idx = ((values.len() as f64) * p).ceil() as usize;
    let idx = idx.saturating_sub(1).min(values.len() - 1);
    values[idx]
}
