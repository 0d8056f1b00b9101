use criterion::{black_box, criterion_group, criterion_main, Criterion};
use netcalc_classify::classify;
use netcalc_core::{parse, FamilyHint, ParsedAddress, ParsedNetwork};
use netcalc_subnet::{subnet_info, CloudReservationPolicy};

fn benchmark_parse(c: &mut Criterion) {
    c.bench_function("parse_ipv4_cidr", |b| {
        b.iter(|| parse(black_box("10.20.30.40/24"), FamilyHint::Auto))
    });

    c.bench_function("parse_ipv6_compressed", |b| {
        b.iter(|| parse(black_box("2001:db8::8a2e:370:7334/64"), FamilyHint::Auto))
    });
}

fn benchmark_classify(c: &mut Criterion) {
    // 104.16.1.1 = Cloudflare edge
    let cdn: ParsedAddress = "104.16.1.1".parse().unwrap();
    let public: ParsedAddress = "8.8.8.8".parse().unwrap();

    c.bench_function("classify_cdn_v4", |b| b.iter(|| classify(black_box(&cdn))));
    c.bench_function("classify_public_v4", |b| {
        b.iter(|| classify(black_box(&public)))
    });
}

fn benchmark_subnet_info(c: &mut Criterion) {
    let v4: ParsedNetwork = "10.0.0.0/24".parse().unwrap();
    let v6: ParsedNetwork = "2001:db8::/48".parse().unwrap();

    c.bench_function("subnet_info_azure_v4", |b| {
        b.iter(|| subnet_info(black_box(&v4), &CloudReservationPolicy::AZURE))
    });
    c.bench_function("subnet_info_standard_v6", |b| {
        b.iter(|| subnet_info(black_box(&v6), &CloudReservationPolicy::STANDARD))
    });
}

criterion_group!(
    benches,
    benchmark_parse,
    benchmark_classify,
    benchmark_subnet_info
);
criterion_main!(benches);
