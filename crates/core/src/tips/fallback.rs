use crate::domain::tip::{Priority, Tip};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;

pub const FALLBACK_TIPS: [(&str, &str, Priority); 5] = [
    (
        "Build an emergency fund",
        "Aim to keep three to six months of essential expenses in an easily accessible savings account.",
        Priority::High,
    ),
    (
        "Track every expense",
        "Log your spending for a month to see where your money actually goes and spot easy cuts.",
        Priority::High,
    ),
    (
        "Automate your savings",
        "Set up an automatic transfer to savings on payday so you save before you spend.",
        Priority::Medium,
    ),
    (
        "Review your subscriptions",
        "Cancel recurring services you rarely use and put the difference toward your goals.",
        Priority::Medium,
    ),
    (
        "Follow the 50/30/20 rule",
        "Split income into 50% needs, 30% wants and 20% savings or debt repayment as a starting budget.",
        Priority::Low,
    ),
];

const MIN_TIPS: usize = 3;

/// Static, non-personalised tips served whenever no provider answer is usable.
#[derive(Debug)]
pub struct FallbackTips {
    rng: Mutex<StdRng>,
}

impl FallbackTips {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// The full fixed list, in order.
    pub fn all() -> Vec<Tip> {
        FALLBACK_TIPS
            .iter()
            .map(|(title, description, priority)| Tip::new(*title, *description, *priority))
            .collect()
    }

    /// A random contiguous run of 3-5 tips from the fixed list, order preserved.
    pub fn pick(&self) -> Vec<Tip> {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let len = rng.gen_range(MIN_TIPS..=FALLBACK_TIPS.len());
        let start = rng.gen_range(0..=FALLBACK_TIPS.len() - len);
        drop(rng);

        Self::all().into_iter().skip(start).take(len).collect()
    }
}

impl Default for FallbackTips {
    fn default() -> Self {
        Self::new()
    }
}
