use hashchain_core::Chain;
use rand::Rng;

pub fn txs(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

pub fn random_transactions<R: Rng>(rng: &mut R) -> Vec<String> {
    let count = rng.gen_range(0..5);
    (0..count)
        .map(|_| {
            format!(
                "{} sCoin user{} to user{}",
                rng.gen_range(1..1_000),
                rng.gen_range(0..10),
                rng.gen_range(0..10)
            )
        })
        .collect()
}

/// A chain with `blocks` random blocks on top of genesis.
pub fn random_chain<R: Rng>(rng: &mut R, blocks: usize) -> Chain {
    let mut chain = Chain::new();
    for _ in 0..blocks {
        chain.append(random_transactions(rng));
    }
    chain
}
