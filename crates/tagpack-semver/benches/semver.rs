use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tagpack_semver::{Comparator, VersionParser};

fn bench_normalize_tags(c: &mut Criterion) {
    let parser = VersionParser::new();
    let tags = [
        "v1.2.3",
        "1.2.3-beta.1",
        "2.4.0+build.5",
        "2020.04.20",
        "1.2.3-rc1",
        "1.2.3-pl1",
        "release-candidate",
        "1.2.3-alpha2",
    ];

    c.bench_function("normalize_tags", |b| {
        b.iter(|| {
            for tag in tags {
                black_box(parser.normalize(black_box(tag)).ok());
            }
        })
    });
}

fn bench_normalize_branches(c: &mut Criterion) {
    let parser = VersionParser::new();
    let branches = ["master", "main", "2.1", "v3.x", "feature/login", "1.0.*", "hotfix@dev"];

    c.bench_function("normalize_branches", |b| {
        b.iter(|| {
            for branch in branches {
                black_box(parser.normalize_branch(black_box(branch)).ok());
            }
        })
    });
}

fn bench_sort_versions(c: &mut Criterion) {
    let versions = [
        "1.0.0.0",
        "1.0.0.0-RC1",
        "2.1.9999999.9999999-dev",
        "dev-feature",
        "9999999-dev",
        "0.9.3.0-beta2",
        "1.0.0.0-patch1",
    ];

    c.bench_function("sort_versions", |b| {
        b.iter(|| {
            let mut sorted = versions.to_vec();
            sorted.sort_by(|a, b| Comparator::compare(a, b));
            black_box(sorted);
        })
    });
}

criterion_group!(benches, bench_normalize_tags, bench_normalize_branches, bench_sort_versions);
criterion_main!(benches);
