use rand::{Rng, SeedableRng, rngs::StdRng};

/// Generate n random templates that only use `if`/`elif`/`else`, `block` and
/// integer equality, so every engine under test renders them the same way.
pub fn generate_random_templates(n: usize) -> Vec<String> {
    let mut rng = StdRng::seed_from_u64(42); // Fixed seed for reproducibility
    (0..n)
        .map(|_| random_template(&mut rng, 3, &mut 0))
        .collect()
}

// Block names stay unique within a template, which Jinja requires.
fn random_template(rng: &mut StdRng, depth: usize, blocks: &mut usize) -> String {
    let mut out = String::new();
    let parts = rng.random_range(2..6);

    for _ in 0..parts {
        out.push_str(&random_string(rng, 5, 30));
        if depth == 0 {
            continue;
        }
        match rng.random_range(0..3) {
            0 => {
                *blocks += 1;
                out.push_str(&format!("{{% block b{} %}}", blocks));
                out.push_str(&random_template(rng, depth - 1, blocks));
                out.push_str("{% endblock %}");
            }
            1 => {
                out.push_str(&format!("{{% if {} %}}", condition(rng)));
                out.push_str(&random_template(rng, depth - 1, blocks));
                for _ in 0..rng.random_range(0..3) {
                    out.push_str(&format!("{{% elif {} %}}", condition(rng)));
                    out.push_str(&random_template(rng, depth - 1, blocks));
                }
                if rng.random_bool(0.5) {
                    out.push_str("{% else %}");
                    out.push_str(&random_template(rng, depth - 1, blocks));
                }
                out.push_str("{% endif %}");
            }
            _ => {}
        }
    }

    out
}

fn condition(rng: &mut StdRng) -> String {
    let a = rng.random_range(0..4);
    if rng.random_bool(0.3) {
        a.to_string()
    } else {
        format!("{} == {}", a, rng.random_range(0..4))
    }
}

/// Generate a random string with length between min and max
fn random_string(rng: &mut StdRng, min_len: usize, max_len: usize) -> String {
    const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz <>/\n";
    let len = rng.random_range(min_len..=max_len);

    (0..len)
        .map(|_| char::from(CHARSET[rng.random_range(0..CHARSET.len())]))
        .collect()
}

// Print binary size information - can be used from individual benchmarks
pub fn print_binary_size() {
    let binary_path = std::env::current_exe().unwrap();
    let metadata = std::fs::metadata(binary_path.clone()).unwrap();
    let size_bytes = metadata.len();
    let size_kb = size_bytes as f64 / 1024.0;
    let size_mb = size_kb / 1024.0;

    println!(
        "Binary size: {:.2} MB ({:.2} KB, {} bytes)",
        size_mb, size_kb, size_bytes
    );
    println!("Binary path: {}", binary_path.display());
}
