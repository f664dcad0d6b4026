//! Reduction benchmarks
//!
//! Measures `reduce` as the number of oracles and the message window grow.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use xchain_commit_core::{reduce, Blake3MerkleBuilder, ChainSelector, Config, Observation, OracleId, Outcome};
use xchain_commit_testkit::fixtures::ObservationFixture;

const SOURCES: [ChainSelector; 4] = [
    ChainSelector(1),
    ChainSelector(2),
    ChainSelector(3),
    ChainSelector(4),
];
const DEST: ChainSelector = ChainSelector(99);

fn setup(oracles: u8, window: u64) -> (Vec<Observation>, Config) {
    let f = (oracles as u32 - 1) / 3;
    let mut config = Config::new(OracleId(0), DEST);
    config.f_chain.insert(DEST, f);
    for chain in SOURCES {
        config.f_chain.insert(chain, f);
    }

    let observations = (0..oracles)
        .map(|i| {
            let mut fixture = ObservationFixture::new();
            for chain in SOURCES {
                fixture = fixture
                    .latest(chain, 100)
                    .f_chain(chain, f)
                    .gas_price(chain, 1_000 + i as u128)
                    .msgs(chain, 101..=100 + window);
            }
            fixture.token_price("0x1", 5 + i as u128).build()
        })
        .collect();

    (observations, config)
}

fn bench_reduce(c: &mut Criterion) {
    let mut group = c.benchmark_group("reduce");

    for oracles in [4u8, 16, 31] {
        for window in [16u64, 256] {
            let (observations, config) = setup(oracles, window);
            group.throughput(Throughput::Elements(oracles as u64 * window * SOURCES.len() as u64));
            group.bench_with_input(
                BenchmarkId::new(format!("oracles_{oracles}"), window),
                &observations,
                |b, observations| {
                    b.iter(|| {
                        reduce(
                            black_box(observations),
                            &Outcome::default(),
                            &config,
                            &Blake3MerkleBuilder,
                        )
                    })
                },
            );
        }
    }

    group.finish();
}

criterion_group!(benches, bench_reduce);
criterion_main!(benches);
