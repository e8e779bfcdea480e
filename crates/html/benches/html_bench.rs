use criterion::{Criterion, black_box, criterion_group, criterion_main};
use html::{build, build_from_tokens, tokenize};

const SMALL_BLOCKS: usize = 64;
const LARGE_BLOCKS: usize = 20_000;

const BLOCK_TEMPLATE: &str =
    "<div class=box><span>hello</span><input @value=x #checked><img src=x></div>";

fn make_blocks(blocks: usize) -> String {
    BLOCK_TEMPLATE.repeat(blocks)
}

fn make_head_heavy(blocks: usize) -> String {
    let mut markup = String::new();
    for i in 0..blocks {
        markup.push_str(&format!("<meta name=m{i}><link rel=preload href=/{i}>"));
    }
    markup.push_str(&make_blocks(blocks));
    markup
}

fn bench_tokenize_small(c: &mut Criterion) {
    let input = make_blocks(SMALL_BLOCKS);
    c.bench_function("bench_tokenize_small", |b| {
        b.iter(|| black_box(tokenize(black_box(&input)).len()));
    });
}

fn bench_tokenize_large(c: &mut Criterion) {
    let input = make_blocks(LARGE_BLOCKS);
    c.bench_function("bench_tokenize_large", |b| {
        b.iter(|| black_box(tokenize(black_box(&input)).len()));
    });
}

fn bench_tree_build_large(c: &mut Criterion) {
    let input = make_blocks(LARGE_BLOCKS);
    let tokens = tokenize(&input);
    c.bench_function("bench_tree_build_large", |b| {
        b.iter(|| black_box(build_from_tokens(black_box(tokens.clone()))));
    });
}

fn bench_build_head_relocation(c: &mut Criterion) {
    let input = make_head_heavy(2_000);
    c.bench_function("bench_build_head_relocation", |b| {
        b.iter(|| black_box(build(black_box(&input))));
    });
}

criterion_group!(
    benches,
    bench_tokenize_small,
    bench_tokenize_large,
    bench_tree_build_large,
    bench_build_head_relocation
);
criterion_main!(benches);
