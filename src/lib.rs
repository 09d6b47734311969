pub mod student_id;
pub mod meal;
pub mod transaction;
pub mod sqlite_source;
pub mod dataset;
pub mod filter;
pub mod aggregate;
pub mod dashboard;
pub mod export;
pub mod server;


pub use student_id::{StudentId, StudentIdError};
pub use meal::{parse_weekday, weekday_name, Meal, ParseMealError, WEEKDAYS};
pub use transaction::{InMemoryTransactionSource, ServiceTime, SourceError, Transaction, TransactionSource};
pub use sqlite_source::{SqliteTransactionSource, DEFAULT_TABLE};
pub use dataset::{enrich, CalendarFields, Dataset, EnrichedTransaction, YearMonth};
pub use filter::{filter_by_date_range, filter_by_set, RowSet, Selection, TimeRange};
pub use aggregate::{
    aggregate_by_gender,
    aggregate_by_meal,
    aggregate_by_month,
    CategorySummary,
    GenderCount,
    GenderSummary,
    MealCount,
    MonthlyCharge,
    TimeSeries,
};
pub use dashboard::{filter_options, run, DashboardParams, DashboardView, FilterOptions};
pub use export::{to_csv, CsvRecord, ExportError, ExportTable, TransactionRecord};
pub use server::{create_router, run_server, ApiError, AppState, ServerConfig};
