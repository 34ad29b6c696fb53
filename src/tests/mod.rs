// Shared test helpers: deterministic pseudo-random chunk sizing so streaming
// tests cover arbitrary split points without flakiness.
fn lcg_sizes(seed: u64, len: usize) -> Vec<usize> {
    let mut x = seed;
    let mut out = Vec::new();
    let mut total = 0usize;
    while total < len {
        x = x.wrapping_mul(1664525).wrapping_add(1013904223);
        let mut n = (((x >> 24) as usize) % 16) + 1;
        if total + n > len {
            n = len - total;
        }
        out.push(n);
        total += n;
    }
    out
}

fn chunk_by_char(s: &str, sizes: &[usize]) -> Vec<String> {
    let mut res = Vec::new();
    let mut iter = s.chars();
    for &n in sizes {
        let mut chunk = String::new();
        for _ in 0..n {
            if let Some(c) = iter.next() {
                chunk.push(c);
            } else {
                break;
            }
        }
        if chunk.is_empty() {
            break;
        }
        res.push(chunk);
    }
    let rest: String = iter.collect();
    if !rest.is_empty() {
        res.push(rest);
    }
    res
}

mod renderer_lifecycle;
mod renderer_metrics;
