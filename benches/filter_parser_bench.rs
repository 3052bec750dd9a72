use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use query_filter::lexer::tokenize;
use query_filter::{FieldConfig, FieldConfigRegistry, FieldType, ParserConfig, QueryFilterParser};
use std::hint::black_box;

// 创建基准测试使用的字段注册表
fn create_registry() -> FieldConfigRegistry {
    FieldConfigRegistry::new()
        .with_field("name", FieldConfig::string("Name").not_null_guard())
        .with_field("title", FieldConfig::string("Title").case_insensitive().not_null_guard())
        .with_field("age", FieldConfig::new("Age", FieldType::Int32))
        .with_field("id", FieldConfig::new("Id", FieldType::Int64))
        .with_field("active", FieldConfig::new("Active", FieldType::Boolean))
        .with_field("created", FieldConfig::new("CreatedAt", FieldType::DateTime))
}

fn test_cases() -> Vec<(&'static str, String)> {
    let ids: Vec<String> = (1..=500).map(|i| i.to_string()).collect();
    vec![
        ("simple", "name eq 'bob'".to_string()),
        ("medium", "name startswith 'b' and age gt 21 and active".to_string()),
        (
            "complex",
            "title contains 'Release Plan' and (age ge 18 or not (active eq false)) and created lt '2024-01-01T00:00:00Z'"
                .to_string(),
        ),
        ("large_in", format!("id in ({})", ids.join(", "))),
    ]
}

// 基准测试：词法分析性能
fn benchmark_lexer(c: &mut Criterion) {
    let mut group = c.benchmark_group("lexer_performance");

    for (name, filter) in test_cases() {
        group.bench_with_input(BenchmarkId::new("tokenize", name), &filter, |b, filter| {
            b.iter(|| black_box(tokenize(black_box(filter)).expect("分词应该成功")))
        });
    }

    group.finish();
}

// 基准测试：完整的端到端解析
fn benchmark_parser(c: &mut Criterion) {
    let registry = create_registry();
    let parser = QueryFilterParser::with_config(
        &registry,
        ParserConfig {
            max_filter_length: 64 * 1024,
            ..Default::default()
        },
    );

    let mut group = c.benchmark_group("parser_performance");

    for (name, filter) in test_cases() {
        group.bench_with_input(BenchmarkId::new("parse", name), &filter, |b, filter| {
            b.iter(|| match parser.parse(black_box(filter)) {
                Ok(result) => black_box(result),
                Err(e) => panic!("解析失败: {}", e),
            })
        });
    }

    group.finish();
}

// 基准测试：错误路径（应尽早失败）
fn benchmark_rejections(c: &mut Criterion) {
    let registry = create_registry();
    let parser = QueryFilterParser::new(&registry);
    let cases = vec![
        ("unknown_field", "height gt 3"),
        ("type_mismatch", "age eq 'x' and name eq 'bob'"),
        ("unbalanced", "((name eq 'bob') and age gt 3"),
    ];

    let mut group = c.benchmark_group("rejection_performance");

    for (name, filter) in cases {
        group.bench_with_input(BenchmarkId::new("reject", name), &filter, |b, &filter| {
            b.iter(|| black_box(parser.parse(black_box(filter)).is_err()))
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_lexer, benchmark_parser, benchmark_rejections);
criterion_main!(benches);
