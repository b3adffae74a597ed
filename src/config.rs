//! Configuration intake (C7): CLI flags with environment-variable
//! fallback and hard-coded defaults (§4.7).
//!
//! Precedence, highest first: explicit CLI flag, then the matching
//! environment variable, then the default. A malformed value at either
//! layer is logged and the default is substituted; [`Config::resolve`]
//! always returns a fully populated, usable configuration, and it never
//! fails the caller.

use std::str::FromStr;

use clap::Parser;
use thiserror::Error;

use crate::barrier::BarrierVariant;
use crate::sort::SortMode;
use crate::wait::WaitPolicy;

const DEFAULT_DATA_SHIFT: u32 = 16;
const DEFAULT_SEGMENT_SIZE: usize = 1024;
const DEFAULT_NUM_THREADS: usize = 4;

/// Errors internal to config resolution. Never escapes
/// [`Config::resolve`]: every variant is caught, logged, and papered
/// over with a default.
#[derive(Debug, Error)]
enum ConfigError {
    #[error("value {value:?} for {field} is not a valid non-negative integer")]
    NotAnInteger { field: &'static str, value: String },
    #[error("value {value:?} for {field} is not a power of two")]
    NotAPowerOfTwo { field: &'static str, value: String },
    #[error("value {value:?} for {field} is not recognized")]
    UnrecognizedTag { field: &'static str, value: String },
}

/// Command-line surface for the `parasort` binary (§6).
#[derive(Parser, Debug, Clone)]
#[command(name = "parasort", about = "Segmented bitonic-merge sort driver")]
pub struct CliArgs {
    /// log2 of the number of elements to sort.
    #[arg(long)]
    pub data_shift: Option<u32>,

    /// Number of elements per segment (must be a power of two).
    #[arg(long)]
    pub segment_size: Option<usize>,

    /// Number of worker threads.
    #[arg(long)]
    pub num_threads: Option<usize>,

    /// Spin-wait policy used while threads coordinate.
    #[arg(long, value_enum)]
    pub wait_policy: Option<WaitPolicy>,

    /// Coordination strategy for the bitonic merging network.
    #[arg(long)]
    pub sort_mode: Option<String>,

    /// Barrier implementation, for modes that use one.
    #[arg(long, value_enum)]
    pub barrier_variant: Option<BarrierVariant>,
}

/// Fully resolved run configuration. Every field is always populated;
/// see module docs for the resolution order.
#[derive(Debug, Clone)]
pub struct Config {
    pub data_shift: u32,
    pub segment_size: usize,
    pub num_threads: usize,
    pub wait_policy: WaitPolicy,
    pub sort_mode: SortModeTag,
    pub barrier_variant: BarrierVariant,
}

/// Symbolic sort-mode selector carried by [`Config`], resolved to a
/// concrete [`SortMode`] (with its own `barrier_variant`) by
/// [`Config::sort_mode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SortModeTag {
    Sequential,
    ForkJoin,
    #[default]
    Barrier,
    LockFree,
    Stealing,
    StealingWaitFree,
}

impl FromStr for SortModeTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sequential" => Ok(SortModeTag::Sequential),
            "fork_join" => Ok(SortModeTag::ForkJoin),
            "barrier" => Ok(SortModeTag::Barrier),
            "lock_free" => Ok(SortModeTag::LockFree),
            "stealing" => Ok(SortModeTag::Stealing),
            "stealing_wait_free" => Ok(SortModeTag::StealingWaitFree),
            other => Err(format!("unrecognized sort mode {other:?}")),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_shift: DEFAULT_DATA_SHIFT,
            segment_size: DEFAULT_SEGMENT_SIZE,
            num_threads: DEFAULT_NUM_THREADS,
            wait_policy: WaitPolicy::default(),
            sort_mode: SortModeTag::default(),
            barrier_variant: BarrierVariant::default(),
        }
    }
}

impl Config {
    /// Resolves a full [`Config`] from parsed CLI args, falling back to
    /// environment variables and then defaults, field by field. Always
    /// succeeds: a malformed override is logged at `warn` level and
    /// skipped in favor of the next source.
    pub fn resolve(args: &CliArgs) -> Self {
        let defaults = Config::default();

        let data_shift = args.data_shift.unwrap_or_else(|| {
            resolve_env("DATA_SHIFT", defaults.data_shift, |s| {
                s.parse::<u32>()
                    .map_err(|_| ConfigError::NotAnInteger {
                        field: "DATA_SHIFT",
                        value: s.to_string(),
                    })
            })
        });

        let segment_size = args.segment_size.unwrap_or_else(|| {
            resolve_env("SEGMENT_SIZE", defaults.segment_size, |s| {
                let n = s.parse::<usize>().map_err(|_| ConfigError::NotAnInteger {
                    field: "SEGMENT_SIZE",
                    value: s.to_string(),
                })?;
                if n == 0 || !n.is_power_of_two() {
                    return Err(ConfigError::NotAPowerOfTwo {
                        field: "SEGMENT_SIZE",
                        value: s.to_string(),
                    });
                }
                Ok(n)
            })
        });

        let num_threads = args.num_threads.unwrap_or_else(|| {
            resolve_env("NUM_THREADS", defaults.num_threads, |s| {
                let n = s.parse::<usize>().map_err(|_| ConfigError::NotAnInteger {
                    field: "NUM_THREADS",
                    value: s.to_string(),
                })?;
                if n == 0 {
                    return Err(ConfigError::NotAnInteger {
                        field: "NUM_THREADS",
                        value: s.to_string(),
                    });
                }
                Ok(n)
            })
        });

        let wait_policy = args.wait_policy.unwrap_or_else(|| {
            resolve_env("WAIT_POLICY", defaults.wait_policy, |s| {
                s.parse::<WaitPolicy>().map_err(|_| ConfigError::UnrecognizedTag {
                    field: "WAIT_POLICY",
                    value: s.to_string(),
                })
            })
        });

        let sort_mode = match &args.sort_mode {
            Some(s) => s.parse::<SortModeTag>().unwrap_or_else(|_| {
                log::warn!("unrecognized --sort_mode {s:?}, using default");
                defaults.sort_mode
            }),
            None => defaults.sort_mode,
        };

        let barrier_variant = args.barrier_variant.unwrap_or(defaults.barrier_variant);

        Self {
            data_shift,
            segment_size,
            num_threads,
            wait_policy,
            sort_mode,
            barrier_variant,
        }
    }

    /// Parses CLI args from `std::env::args` and resolves them.
    pub fn from_env_and_args() -> Self {
        Self::resolve(&CliArgs::parse())
    }

    /// Resolves the `sort_mode` tag and `barrier_variant` into the
    /// concrete [`SortMode`] `sort::sort` expects.
    pub fn resolved_sort_mode(&self) -> SortMode {
        match self.sort_mode {
            SortModeTag::Sequential => SortMode::Sequential,
            SortModeTag::ForkJoin => SortMode::ForkJoin,
            SortModeTag::Barrier => SortMode::Barrier(self.barrier_variant),
            SortModeTag::LockFree => SortMode::LockFree,
            SortModeTag::Stealing => SortMode::Stealing {
                barrier_variant: self.barrier_variant,
                wait_free: false,
            },
            SortModeTag::StealingWaitFree => SortMode::Stealing {
                barrier_variant: self.barrier_variant,
                wait_free: true,
            },
        }
    }

    /// Number of elements to sort: `1 << data_shift`.
    pub fn num_elements(&self) -> usize {
        1usize << self.data_shift
    }
}

/// Reads `var`, parses it with `parse`, logs and falls back to
/// `default` on any failure (missing variable or parse error).
fn resolve_env<T, E: std::fmt::Display>(
    var: &'static str,
    default: T,
    parse: impl FnOnce(&str) -> Result<T, E>,
) -> T {
    match std::env::var(var) {
        Ok(raw) => match parse(&raw) {
            Ok(value) => value,
            Err(err) => {
                log::warn!("ignoring invalid {var}={raw:?}: {err}");
                default
            }
        },
        Err(_) => default,
    }
}
