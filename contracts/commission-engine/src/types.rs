use soroban_sdk::{contracterror, contracttype, Address, Vec};

/// Side of the two-leg placement tree
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Leg {
    Left,
    Right,
}

/// Per-category earnings accumulators for a member
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Earnings {
    pub roi: i128,        // Daily return credited on own packages
    pub commission: i128, // Level income earned on downline purchases
    pub binary: i128,     // Two-leg matching bonus
    pub booster: i128,    // Extra ROI from an achieved booster
    pub roi_on_roi: i128, // Share of downline daily returns
    pub reward: i128,     // Monthly 3-leg milestone rewards
}

/// Core member record containing wallet and relationship data
#[contracttype]
#[derive(Clone)]
pub struct UserData {
    pub address: Address,               // Member's address
    pub sponsor: Option<Address>,       // Unilevel upline pointer
    pub direct_referrals: Vec<Address>, // Directly sponsored members
    pub wallet_balance: i128,           // Spendable internal balance
    pub total_investment: i128,         // Lifetime principal purchased
    pub total_withdrawal: i128,         // Lifetime amount paid out
    pub earnings: Earnings,             // Per-category accumulators
    pub is_active: bool,                // Holds at least one active package
    pub first_investment_date: u64,     // Set once on first purchase, 0 = unset
    pub rank: u32,                      // Highest reward milestone reached
    pub joined_at: u64,                 // Registration timestamp
}

/// Package lifecycle states
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PackageStatus {
    Active,    // Accruing daily returns
    Completed, // Return ceiling reached or expired
}

/// An investment package owned by a member
#[contracttype]
#[derive(Clone)]
pub struct Package {
    pub id: u64,
    pub owner: Address,
    pub principal: i128,        // Amount invested
    pub daily_roi_amount: i128, // Base credit per daily run
    pub total_roi_earned: i128, // Monotonic, never exceeds the limit
    pub total_roi_limit: i128,  // principal * max return percentage
    pub has_booster: bool,      // Earns the booster bonus each run
    pub booster_roi_bps: u32,   // Bonus rate frozen at achievement time
    pub status: PackageStatus,
    pub created_at: u64,
    pub expiry_date: u64,
}

/// Booster lifecycle states
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum BoosterStatus {
    Active,   // Countdown running
    Achieved, // Target met inside the window, one-way
    Expired,  // Window closed without meeting the target, one-way
}

/// Time-boxed bonus qualification attached to a member's first purchase
#[contracttype]
#[derive(Clone)]
pub struct Booster {
    pub owner: Address,
    pub start_date: u64,
    pub end_date: u64,        // start_date + countdown window
    pub direct_count: u32,    // Cached count, recomputed on refresh
    pub target_directs: u32,  // Active directs needed to achieve
    pub bonus_roi_bps: u32,   // Extra ROI granted on achievement
    pub status: BoosterStatus,
}

/// Node in the two-leg placement tree with per-leg volume counters
#[contracttype]
#[derive(Clone)]
pub struct BinaryNode {
    pub parent: Option<Address>,
    pub position: Option<Leg>,       // Which leg of the parent this node fills
    pub left_child: Option<Address>,
    pub right_child: Option<Address>,
    pub left_volume: i128,           // Unmatched volume carried in the left leg
    pub right_volume: i128,          // Unmatched volume carried in the right leg
    pub personal_volume: i128,       // Own purchases
    pub left_since: u64,             // Oldest unmatched left volume timestamp
    pub right_since: u64,            // Oldest unmatched right volume timestamp
}

/// Categories a withdrawal can draw from
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum WithdrawalKind {
    Roi,
    Principal,
    Commission,
    Bonus,
}

/// Withdrawal lifecycle states
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum WithdrawalStatus {
    Pending,
    Approved,
    Rejected,
}

/// A withdrawal request with deduction figures frozen at request time
#[contracttype]
#[derive(Clone)]
pub struct Withdrawal {
    pub id: u64,
    pub user: Address,
    pub kind: WithdrawalKind,
    pub requested_amount: i128,
    pub deduction_bps: u32,     // Frozen, never recomputed at approval
    pub deduction_amount: i128,
    pub final_amount: i128,
    pub status: WithdrawalStatus,
    pub investment_date: u64,   // Snapshot of first_investment_date
    pub days_held: u64,         // Snapshot at request time
    pub requested_at: u64,
}

/// Closed-period 3-leg volume figures for one member
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BusinessVolume {
    pub leg1: i128,            // Largest leg by period volume
    pub leg2: i128,
    pub leg3: i128,            // Third largest, assumed the 20% leg
    pub qualified_volume: i128, // After the 40:40:20 ratio cap
}

/// Ledger entry categories
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TransactionKind {
    RoiDistribution,  // Base daily return
    BoosterRoi,       // Booster bonus on the daily return
    RoiOnRoi,         // Upline share of a downline daily return
    LevelIncome,      // Upline share of a downline purchase
    BinaryMatching,   // Two-leg matching bonus
    Reward,           // Monthly 3-leg milestone
    WithdrawalDebit,  // Funds paid out, negative amount
    WithdrawalRefund, // Hold returned after rejection
}

/// Append-only audit row on a member's ledger
#[contracttype]
#[derive(Clone)]
pub struct Transaction {
    pub kind: TransactionKind,
    pub amount: i128,                  // Negative for debits
    pub counterparty: Option<Address>, // Downline source, if any
    pub level: u32,                    // Cascade depth, 0 when not applicable
    pub timestamp: u64,
}

/// Payout row written alongside cascade credits
#[contracttype]
#[derive(Clone)]
pub struct Payout {
    pub source: Address, // Downline member whose activity produced the credit
    pub amount: i128,
    pub level: u32,
    pub timestamp: u64,
}

/// Commission reporting row written alongside cascade credits
#[contracttype]
#[derive(Clone)]
pub struct Commission {
    pub source: Address,
    pub amount: i128,
    pub level: u32,
    pub kind: TransactionKind,
    pub timestamp: u64,
}

/// Package purchase rules
#[contracttype]
#[derive(Clone)]
pub struct PlanConfig {
    pub base_amount: i128,   // Purchases must be a multiple of this
    pub min_amount: i128,
    pub max_amount: i128,
    pub daily_roi_bps: u32,  // Daily return as basis points of principal
    pub max_return_bps: u32, // Return ceiling, e.g. 20000 = 200%
    pub duration_days: u64,  // Package life before forced completion
}

/// One step of the directs-to-unlocked-levels table
#[contracttype]
#[derive(Clone)]
pub struct LevelStep {
    pub min_directs: u32,     // Active directs needed to enter this step
    pub unlocked_levels: u32, // Depths open once entered
}

/// Unlock tables for the two cascades
#[contracttype]
#[derive(Clone)]
pub struct LevelUnlockSteps {
    pub roi_on_roi: Vec<LevelStep>,   // Caps at the 15-deep cascade
    pub level_income: Vec<LevelStep>, // Caps at the 30-deep cascade
}

/// Booster qualification rules
#[contracttype]
#[derive(Clone)]
pub struct BoosterConfig {
    pub countdown_days: u64,  // Window length from first investment
    pub target_directs: u32,  // Active directs needed inside the window
    pub bonus_roi_bps: u32,   // Extra daily return once achieved
}

/// Two-leg matching rules
#[contracttype]
#[derive(Clone)]
pub struct BinaryConfig {
    pub matching_bps: u32,           // Bonus rate on the matched volume
    pub daily_cap: i128,
    pub weekly_cap: i128,
    pub monthly_cap: i128,
    pub max_carry_forward_days: u64, // Unmatched volume older than this is discarded
}

/// Principal withdrawal deduction tiers
#[contracttype]
#[derive(Clone)]
pub struct WithdrawalConfig {
    pub tier_before_bps: u32,   // Held fewer than tier_boundary_days
    pub tier_after_bps: u32,    // Held tier_boundary_days or longer
    pub tier_boundary_days: u64,
}

/// A monthly reward milestone paid against qualified 3-leg volume
#[contracttype]
#[derive(Clone)]
pub struct RewardMilestone {
    pub id: u32,
    pub required_volume: i128, // Qualified volume needed
    pub reward_amount: i128,
}

/// Independently toggled engine features
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Feature {
    Roi,
    RoiOnRoi,
    LevelIncome,
    Booster,
    Binary,
    Rewards,
}

/// Outcome of one daily distribution run
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RoiRunSummary {
    pub processed: u32,         // Packages credited this run
    pub total_amount: i128,     // Base plus booster credited to owners
    pub completed: u32,         // Packages that reached their ceiling or expired
    pub booster_bonuses: u32,   // Packages that earned a booster bonus
    pub roi_on_roi_total: i128, // Cascade credits across all ancestors
    pub failed: u32,            // Packages skipped after an update error
}

/// Outcome of one matching run
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BinaryRunSummary {
    pub processed: u32,   // Members with matched volume this run
    pub total_paid: i128,
}

/// Outcome of one monthly reward run
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RewardRunSummary {
    pub evaluated: u32,  // Members with three or more legs examined
    pub rewarded: u32,   // Milestone payments made
    pub total_paid: i128,
}

/// Unlocked depth counts for both cascades
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UnlockedLevels {
    pub roi_on_roi: u32,
    pub level_income: u32,
}

/// Storage keys for contract data
#[contracttype]
pub enum DataKey {
    Admin,                             // Engine administrator
    PayoutToken,                       // Token held for purchases and payouts
    EnginePaused,                      // Emergency stop
    Feature(Feature),                  // Per-feature toggle, enabled by default
    PlanConfig,                        // Purchase rules
    RoiOnRoiRates,                     // Vec<u32> bps per cascade level
    LevelIncomeRates,                  // Vec<u32> bps per cascade level
    LevelUnlockSteps,                  // Directs-to-levels tables
    BoosterConfig,                     // Qualification rules
    BinaryConfig,                      // Matching rules
    WithdrawalConfig,                  // Deduction tiers
    RewardMilestone(u32),              // Milestone data
    MilestoneCount,                    // Next milestone id
    User(Address),                     // Member record
    AllUsers,                          // Registration order, for batch jobs
    TotalUsers,                        // Registered member count
    Package(u64),                      // Package record
    PackageCounter,                    // Next package id
    ActivePackages,                    // Ids the daily run iterates
    UserPackages(Address),             // Package ids owned by a member
    Booster(Address),                  // Booster record keyed by owner
    BoosterMembers,                    // Owners the expiry sweep iterates
    BinaryNode(Address),               // Placement-tree node
    BinaryMembers,                     // Members the matching run iterates
    BinaryPaidDay(Address, u64),       // Matching paid in a day window
    BinaryPaidWeek(Address, u64),      // Matching paid in a week window
    BinaryPaidMonth(Address, u64),     // Matching paid in a month window
    Withdrawal(u64),                   // Withdrawal record
    WithdrawalCounter,                 // Next withdrawal id
    UserWithdrawals(Address),          // Withdrawal ids of a member
    Transactions(Address),             // Append-only audit rows
    Payouts(Address),                  // Cascade payout rows
    Commissions(Address),              // Cascade reporting rows
    BusinessVolume(Address, u32, u32), // Closed-period legs, (user, month, year)
    RoiMark(u64, u64),                 // (package, day) distribution marker
    BinaryMark(Address, u64),          // (member, day) matching marker
    RewardMark(Address, u32, u32, u32), // (member, milestone, month, year) marker
    TotalDistributed,                  // Lifetime credits across all categories
}

/// Contract error types
#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    NotInitialized = 1,      // Engine not initialized
    AlreadyInitialized = 2,  // Engine already set up
    Unauthorized = 3,        // Caller lacks permission
    EnginePaused = 4,        // Emergency stop is on
    AlreadyRegistered = 5,   // Member already exists
    UserNotFound = 6,        // Member doesn't exist
    SponsorNotFound = 7,     // Sponsor doesn't exist
    SelfSponsorship = 8,     // Member cannot sponsor themselves
    FeatureDisabled = 9,     // Operation's feature is toggled off
    ConfigMissing = 10,      // Required rate table not set
    InvalidConfig = 11,      // Configuration failed validation
    InvalidAmount = 12,      // Non-positive or malformed amount
    AmountNotMultiple = 13,  // Purchase not a multiple of the base amount
    AmountBelowMinimum = 14, // Purchase under the plan minimum
    AmountAboveMaximum = 15, // Purchase over the plan maximum
    PackageNotFound = 16,    // Package doesn't exist
    BoosterNotFound = 17,    // Member has no booster
    PositionOccupied = 18,   // Placement slot already filled
    AlreadyPlaced = 19,      // Member already has a tree parent
    PlacementCycle = 20,     // Placement would create a cycle
    BinaryNodeNotFound = 21, // Member has no tree node
    InsufficientBalance = 22,// Wallet can't cover the request
    WithdrawalNotFound = 23, // Withdrawal doesn't exist
    WithdrawalNotPending = 24, // Already approved or rejected
    NoInvestment = 25,       // Principal withdrawal without an investment
    MilestoneNotFound = 26,  // Milestone doesn't exist
    InvalidPeriod = 27,      // Month out of range or not yet closed
}
