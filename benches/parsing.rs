use criterion::{Criterion, criterion_group, criterion_main};
use kg_index::triplet::parse_triplet_response;
use std::fmt::Write;
use std::hint::black_box;

fn llm_response(triplets: usize) -> String {
    let mut response = String::from("Sure! Here are the knowledge triplets I found:\n\n");
    for i in 0..triplets {
        writeln!(response, "{}. (entity {}, relates to, entity {})", i + 1, i, i + 1)
            .expect("writing to a String cannot fail");
        if i % 5 == 0 {
            response.push_str("Note: this one was inferred from context.\n");
        }
    }
    response.push_str("\nLet me know if you need anything else.");
    response
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let short = llm_response(10);
    let long = llm_response(500);

    c.bench_function("parse_triplets_10", |b| {
        b.iter(|| parse_triplet_response(black_box(&short)))
    });
    c.bench_function("parse_triplets_500", |b| {
        b.iter(|| parse_triplet_response(black_box(&long)))
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
