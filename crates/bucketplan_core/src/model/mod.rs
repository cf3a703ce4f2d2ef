mod buckets;
mod expenses;
mod ids;
mod market;
mod records;
mod results;
mod volatility;

pub use buckets::{
    BucketConfig, CostBasisMethod, GrowthBounds, Lot, Trigger, TriggerFrequency, TriggerRule,
    TriggerSide,
};
pub use expenses::{ExpensePeriod, ExpenseSchedule, OneTimeExpense};
pub use ids::BucketId;
pub use market::{FxSettings, InflationSettings};
pub use records::{BucketMonthRecord, MonthRecord, PathResult, PathVerdict};
pub use results::{
    Completeness, MonteCarloConfig, MonteCarloProgress, MonteCarloSummary, PathFailure,
    PercentileCurve,
};
pub use volatility::{ProfileSigmas, VolatilityProfile, VolatilityTable};
