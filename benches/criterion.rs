use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::fmt::Write;
use std::hint::black_box;

use save_tiger::{splice_span, BlockScanner, BraceBalance, ScanOptions};

/// Build a save-like buffer with `provinces` province blocks, each holding a few pops, and the
/// country block `CHI` at the very end.
fn make_save(provinces: usize) -> String {
    let mut save = String::from("date=\"1836.1.1\"\nplayer=\"CHI\"\n");
    for id in 1..=provinces {
        let _ = write!(save, "{id}={{\n\tname=\"Province {id}\"\n\towner=\"CHIEF\"\n");
        for pop in 0..4 {
            let _ = write!(
                save,
                "\tfarmers={{\n\t\tid={}\n\t\tsize=2500\n\t\tideology={{\n\t\t\t1=10.000\n\t\t\t3=45.500\n\t\t}}\n\t}}\n",
                id * 10 + pop
            );
        }
        save.push_str("}\n");
    }
    save.push_str("CHI={\n\tcivilized=yes\n\tINNER={\n\t\ta=1\n\t}\n}\n");
    save
}

fn bench_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("scan");
    group.sample_size(30);
    for provinces in [100, 3000] {
        let save = make_save(provinces);
        group.bench_with_input(BenchmarkId::new("find_key_block", provinces), &save, |b, save| {
            let scanner = BlockScanner::default();
            b.iter(|| scanner.find_key_block(black_box(save), "CHI", 0));
        });
        group.bench_with_input(BenchmarkId::new("find_raw", provinces), &save, |b, save| {
            let scanner = BlockScanner::raw();
            b.iter(|| scanner.find_key_block(black_box(save), "CHI", 0));
        });
        group.bench_with_input(BenchmarkId::new("all_pops", provinces), &save, |b, save| {
            let scanner = BlockScanner::default();
            b.iter(|| scanner.find_key_blocks(black_box(save), "farmers").count());
        });
        group.bench_with_input(BenchmarkId::new("balance", provinces), &save, |b, save| {
            b.iter(|| BraceBalance::measure(black_box(save), ScanOptions::default()));
        });
    }
    group.finish();
}

fn bench_splice(c: &mut Criterion) {
    let save = make_save(3000);
    let span = BlockScanner::default().find_key_block(&save, "CHI", 0).ok().flatten();
    c.bench_function("splice", |b| {
        b.iter(|| span.map(|span| splice_span(black_box(&save), span, "{ civilized=no }")));
    });
}

criterion_group!(benches, bench_scan, bench_splice);
criterion_main!(benches);
