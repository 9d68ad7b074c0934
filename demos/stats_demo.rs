use std::hash::RandomState;

use clap::Parser;
use clap::ValueEnum;
use robin_dense::HashMap;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Hasher {
    /// The map's default integer mixer
    Mix,
    /// std's randomly keyed SipHash
    Sip,
}

#[derive(Parser, Debug)]
struct Args {
    #[arg(short = 'c', long = "target_capacity", default_value_t = 1000)]
    target_capacity: usize,

    #[arg(long, value_enum, default_value_t = Hasher::Mix)]
    hasher: Hasher,

    /// Preallocate the bucket table instead of growing it
    #[arg(long)]
    reserve: bool,
}

fn fill<S: std::hash::BuildHasher>(mut map: HashMap<u64, u64, S>, args: &Args) {
    if args.reserve {
        map.reserve(args.target_capacity);
    }
    println!("Initial capacity: {}", map.capacity());
    println!("Filling map with {} u64 keys...", args.target_capacity);

    let mut num_grows = 0;
    for i in 0..args.target_capacity {
        let buckets = map.bucket_count();
        let key = i as u64;

        if let Err(err) = map.try_insert(key, key) {
            println!("Stopped after {} entries: {err}", map.len());
            break;
        }
        if map.bucket_count() != buckets {
            num_grows += 1;
        }
    }

    println!("Inserted {} entries, growing {} times", map.len(), num_grows);
    println!(
        "Final load factor: {:.2}%",
        (map.len() as f64 / map.bucket_count() as f64) * 100.0
    );

    map.probe_histogram().print();
    map.debug_stats().print();
}

fn main() {
    let args = Args::parse();

    println!(
        "Creating HashMap for target capacity {} with {:?} hashing",
        args.target_capacity, args.hasher
    );

    match args.hasher {
        Hasher::Mix => fill(HashMap::new(), &args),
        Hasher::Sip => fill(HashMap::with_hasher(RandomState::new()), &args),
    }
}
