//! Benchmarks for message parsing, serialization and handler dispatch.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use slirc_client::{handler::demux_ctcp, Address, Client, Message};

/// Simple PING message
const SIMPLE_MESSAGE: &str = "PING :irc.example.com";

/// Message with prefix
const PREFIX_MESSAGE: &str = ":nick!user@host PRIVMSG #channel :Hello, world!";

/// CTCP query
const CTCP_MESSAGE: &str = ":nick!user@host PRIVMSG bot :\x01VERSION\x01";

/// Tagged line; tags are skipped
const TAGGED_MESSAGE: &str = "@time=2023-01-01T00:00:00.000Z;msgid=abc123;+example/tag=value :nick!user@host PRIVMSG #channel :Hello with tags!";

/// Numeric response
const NUMERIC_RESPONSE: &str = ":irc.server.net 001 nickname :Welcome to the IRC Network nickname!user@host";

fn benchmark_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("Message Parsing");

    for (name, line) in [
        ("simple_ping", SIMPLE_MESSAGE),
        ("with_prefix", PREFIX_MESSAGE),
        ("ctcp", CTCP_MESSAGE),
        ("with_tags", TAGGED_MESSAGE),
        ("numeric_response", NUMERIC_RESPONSE),
    ] {
        group.bench_function(name, |b| {
            b.iter(|| {
                let msg: Message = black_box(line).parse().unwrap();
                black_box(msg)
            })
        });
    }

    group.finish();
}

fn benchmark_serialization(c: &mut Criterion) {
    let mut group = c.benchmark_group("Message Serialization");

    let messages = [
        ("privmsg", Message::privmsg("#channel", "Hello, world!")),
        ("user", Message::user("ferris", "Ferris the Crab")),
        ("parsed_numeric", NUMERIC_RESPONSE.parse::<Message>().unwrap()),
    ];

    for (name, message) in &messages {
        group.bench_with_input(BenchmarkId::new("to_string", name), message, |b, msg| {
            b.iter(|| black_box(msg.to_string()))
        });
    }

    group.finish();
}

fn benchmark_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("Dispatch");

    let client = Client::new("bench", "bench", Address::host("localhost", 6667));
    for _ in 0..4 {
        client.add_handler("PRIVMSG", |_, msg| {
            black_box(msg.text());
        });
    }
    let privmsg: Message = PREFIX_MESSAGE.parse().unwrap();
    let ctcp: Message = CTCP_MESSAGE.parse().unwrap();

    group.bench_function("demux_ctcp", |b| {
        b.iter(|| {
            let mut msg = ctcp.clone();
            black_box(demux_ctcp(&mut msg))
        })
    });

    group.bench_function("run_handlers_privmsg", |b| {
        b.iter(|| client.run_handlers(black_box(privmsg.clone())))
    });

    group.bench_function("parse_and_dispatch", |b| {
        b.iter(|| {
            let msg: Message = black_box(PREFIX_MESSAGE).parse().unwrap();
            client.run_handlers(msg)
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_parsing,
    benchmark_serialization,
    benchmark_dispatch
);
criterion_main!(benches);
