//! Optimizer constants and runtime configuration defaults

// Cost function weights
/// Cost charged for every live pattern
pub const DEFAULT_PATTERN_WEIGHT: f64 = 1.0;
/// Extra cost charged for every single-pixel pattern
pub const DEFAULT_SINGLE_PENALTY: f64 = 5.0;
/// Cost charged for every pixel boundary between two patterns
pub const DEFAULT_TRANSITION_WEIGHT: f64 = 0.5;

// Temperature schedule
/// Target probability of accepting a typical worsening move at the start
pub const DEFAULT_INITIAL_ACCEPT_RATIO: f64 = 0.4;
/// Target probability of accepting the smallest worsening move at the end
pub const DEFAULT_FINAL_ACCEPT_RATIO: f64 = 0.01;
/// Geometric cooling factor applied between stages
pub const DEFAULT_COOLING_RATE: f64 = 0.95;
/// Minimum iterations per temperature stage
pub const DEFAULT_MIN_ITERATIONS: usize = 100;
/// Maximum iterations per temperature stage
pub const DEFAULT_MAX_ITERATIONS: usize = 1000;
/// Iterations per stage granted for every live pattern
pub const DEFAULT_ITERATIONS_MULTIPLIER: usize = 4;

// Used when sampling finds no cost change to calibrate against
/// Start temperature as a fraction of the initial cost
pub const START_TEMPERATURE_FALLBACK_RATIO: f64 = 0.01;
/// End temperature as a fraction of the start temperature
pub const END_TEMPERATURE_FALLBACK_RATIO: f64 = 0.01;
/// Sampled delta as a fraction of the initial cost when no move exists
pub const SAMPLE_DELTA_FALLBACK_RATIO: f64 = 0.1;

// Parameter estimation
/// Number of apply-then-undo moves sampled before annealing
pub const DEFAULT_SAMPLE_MOVES: usize = 10;

// Stagnation control
/// Relative cost change below which a stage counts as stagnant
pub const DEFAULT_STAGNATION_THRESHOLD: f64 = 0.1;
/// Consecutive stagnant stages that trigger a cluster interlude
pub const DEFAULT_STAGNATION_PATIENCE: usize = 3;

// Cluster decomposition
/// Clusters larger than this are split into sub-clusters
pub const CLUSTER_SPLIT_THRESHOLD: usize = 10;
/// Inclusive range of the random base count of sub-clusters
pub const SUB_CLUSTER_BASE_RANGE: (usize, usize) = (2, 4);
/// Multipliers applied to the base count of sub-clusters
pub const SUB_CLUSTER_MULTIPLIERS: [usize; 3] = [1, 3, 5];
/// Lower bound on the number of sub-clusters
pub const MIN_SUB_CLUSTERS: usize = 2;
/// Upper bound on the number of sub-clusters
pub const MAX_SUB_CLUSTERS: usize = 12;
/// Proposals tried per cluster iteration before the iteration is skipped
pub const CLUSTER_MOVE_ATTEMPTS: usize = 10;

// Move weights as functions of the temperature ratio r
/// Merge weight at r = 0
pub const MERGE_WEIGHT_BASE: f64 = 1.0;
/// Merge weight growth per unit r
pub const MERGE_WEIGHT_SLOPE: f64 = 2.0;
/// Break weight at r = 1
pub const BREAK_WEIGHT_BASE: f64 = 0.5;
/// Break weight growth per unit (1 - r)
pub const BREAK_WEIGHT_SLOPE: f64 = 2.0;

// Default values for configurable parameters
/// Fixed seed for reproducible optimization
pub const DEFAULT_SEED: u64 = 42;

// Output settings
/// Suffix of the encoded pattern text file
pub const PATTERNS_SUFFIX: &str = "_patterns.txt";
/// Suffix of the statistics JSON file
pub const STATISTICS_SUFFIX: &str = "_stats.json";
/// Suffix of the pattern outline PNG
pub const VISUALIZATION_SUFFIX: &str = "_patterns.png";
/// Suffix of the stage snapshot GIF
pub const SNAPSHOTS_SUFFIX: &str = "_stages.gif";
/// Side length in output pixels of one canvas pixel in renderings
pub const VISUALIZATION_PIXEL_SIZE: u32 = 20;
/// Side length in output pixels of one canvas pixel in GIF snapshots
pub const SNAPSHOT_PIXEL_SIZE: u32 = 8;
/// Width in output pixels of pattern outlines
pub const OUTLINE_WIDTH: u32 = 2;
/// Stage frames kept in memory before older ones are thinned out
pub const MAX_SNAPSHOT_FRAMES: usize = 30;
/// Delay between GIF animation frames
pub const GIF_FRAME_DELAY_MS: u32 = 25;
/// Minimum frame delay that viewers reliably support (in milliseconds)
pub const VIEWER_MIN_FRAME_DELAY_MS: u32 = 50;

// Progress bar display settings
/// Threshold for switching to batch progress mode
pub const MAX_INDIVIDUAL_PROGRESS_BARS: usize = 5;
