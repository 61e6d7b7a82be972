use burger::strutils::{
    encapsulate_path_linux, encapsulate_path_windows, make_version_tuple, parse_csv,
    split_comma_with_quotes, string_to_bool, translate_to_regex_match,
};
use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

const CSV_LINE: &str = r#"alpha,"beta, gamma","say ""hi""",delta,,epsilon"#;

fn bench_quoting(c: &mut Criterion) {
    c.bench_function("encapsulate_path_windows", |b| {
        b.iter(|| {
            let _ = encapsulate_path_windows(black_box(r"C:\Program Files\Tool\bin\tool.exe"));
            let _ = encapsulate_path_windows(black_box(r"C:\tools\plain.exe"));
        })
    });

    c.bench_function("encapsulate_path_linux", |b| {
        b.iter(|| {
            let _ = encapsulate_path_linux(black_box("/home/user/my project/it's here"));
            let _ = encapsulate_path_linux(black_box("/usr/bin/git"));
        })
    });
}

fn bench_csv(c: &mut Criterion) {
    c.bench_function("parse_csv", |b| {
        b.iter(|| parse_csv(black_box(CSV_LINE)).unwrap())
    });

    c.bench_function("split_comma_with_quotes", |b| {
        b.iter(|| split_comma_with_quotes(black_box(r#"a,"b,c",d,"e f""#)).unwrap())
    });
}

fn bench_versions(c: &mut Criterion) {
    c.bench_function("make_version_tuple", |b| {
        b.iter(|| {
            let _ = make_version_tuple(black_box("10.0.22621.0"));
            let _ = make_version_tuple(black_box("17.4.33103.201"));
            let _ = make_version_tuple(black_box("1.2b3"));
        })
    });
}

fn bench_parsing(c: &mut Criterion) {
    c.bench_function("string_to_bool", |b| {
        b.iter(|| {
            let _ = string_to_bool(black_box("Yes"));
            let _ = string_to_bool(black_box("off"));
            let _ = string_to_bool(black_box("0.5"));
        })
    });

    c.bench_function("translate_to_regex_match", |b| {
        b.iter(|| translate_to_regex_match(black_box(&["*.pyc", "build_*", "file?.[ch]"])).unwrap())
    });
}

criterion_group!(benches, bench_quoting, bench_csv, bench_versions, bench_parsing);
criterion_main!(benches);
