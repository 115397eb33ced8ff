//! `aggregate-stats`: totals of a byte-size column and a duration column.
//!
//! ```text
//! aggregate-stats :size :time :total_size :total_time ['MB'] ['s']
//! ```
//!
//! Every batch adds canonical bytes and nanoseconds into the run's
//! transient store. Intermediate batches pass rows through with both total
//! columns set to `0.0`; the final batch emits a single summary row in the
//! requested output units and clears the accumulators.

use crate::core::arguments::Arguments;
use crate::core::token::TokenKind;
use crate::core::usage::UsageSchema;
use crate::error::DirectiveError;
use crate::runtime::context::{ExecutorContext, Scope, ScopedStore};
use crate::runtime::directive::Directive;
use crate::runtime::row::{Row, Value};
use crate::units::{ByteUnit, TimeUnit};
use tracing::{debug, trace};

pub const NAME: &str = "aggregate-stats";

const BYTE_COUNT_KEY: &str = "byte-count";
const BYTE_TOTAL_KEY: &str = "byte-total";
const TIME_COUNT_KEY: &str = "time-count";
const TIME_TOTAL_KEY: &str = "time-total";

#[derive(Debug, Clone)]
pub struct AggregateStats {
    byte_column: String,
    time_column: String,
    byte_total_column: String,
    time_total_column: String,
    byte_output_unit: ByteUnit,
    time_output_unit: TimeUnit,
}

impl Default for AggregateStats {
    fn default() -> Self {
        Self {
            byte_column: String::new(),
            time_column: String::new(),
            byte_total_column: String::new(),
            time_total_column: String::new(),
            byte_output_unit: ByteUnit::MB,
            time_output_unit: TimeUnit::Seconds,
        }
    }
}

/// Accepts the short suffixes and the spelled-out names.
fn time_unit_named(name: &str) -> Option<TimeUnit> {
    match name.trim().to_ascii_lowercase().as_str() {
        "ns" | "nanoseconds" => Some(TimeUnit::Nanoseconds),
        "ms" | "milliseconds" => Some(TimeUnit::Milliseconds),
        "s" | "seconds" => Some(TimeUnit::Seconds),
        "m" | "minutes" => Some(TimeUnit::Minutes),
        "h" | "hours" => Some(TimeUnit::Hours),
        "d" | "days" => Some(TimeUnit::Days),
        _ => None,
    }
}

/// Running totals, canonical units.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Totals {
    byte_count: i64,
    byte_total: i64,
    time_count: i64,
    time_total: i64,
}

impl Totals {
    fn load(store: &ScopedStore<'_>) -> Self {
        let read = |key: &str| {
            store
                .get(Scope::Global, key)
                .and_then(Value::as_i64)
                .unwrap_or(0)
        };
        Self {
            byte_count: read(BYTE_COUNT_KEY),
            byte_total: read(BYTE_TOTAL_KEY),
            time_count: read(TIME_COUNT_KEY),
            time_total: read(TIME_TOTAL_KEY),
        }
    }

    fn save(&self, store: &mut ScopedStore<'_>) {
        store.set(Scope::Global, BYTE_COUNT_KEY, self.byte_count);
        store.set(Scope::Global, BYTE_TOTAL_KEY, self.byte_total);
        store.set(Scope::Global, TIME_COUNT_KEY, self.time_count);
        store.set(Scope::Global, TIME_TOTAL_KEY, self.time_total);
    }

    fn clear(store: &mut ScopedStore<'_>) {
        for key in [BYTE_COUNT_KEY, BYTE_TOTAL_KEY, TIME_COUNT_KEY, TIME_TOTAL_KEY] {
            store.remove(Scope::Global, key);
        }
    }
}

impl AggregateStats {
    fn execution_error(&self, column: &str, message: String) -> DirectiveError {
        DirectiveError::Execution {
            directive: NAME.to_string(),
            column: column.to_string(),
            message,
        }
    }

    fn add(&self, total: i64, amount: u64, column: &str) -> Result<i64, DirectiveError> {
        i64::try_from(amount)
            .ok()
            .and_then(|amount| total.checked_add(amount))
            .ok_or_else(|| self.execution_error(column, "accumulated total overflowed".to_string()))
    }

    fn accumulate(&self, row: &Row, totals: &mut Totals) -> Result<(), DirectiveError> {
        let size = row.value(&self.byte_column);
        let bytes = size.to_byte_size().map_err(|e| {
            self.execution_error(
                &self.byte_column,
                format!("Failed to parse byte size value '{}': {}", size, e),
            )
        })?;
        if let Some(bytes) = bytes {
            totals.byte_total = self.add(totals.byte_total, bytes.bytes(), &self.byte_column)?;
            totals.byte_count += 1;
        }

        let time = row.value(&self.time_column);
        let duration = time.to_time_duration().map_err(|e| {
            self.execution_error(
                &self.time_column,
                format!("Failed to parse time duration value '{}': {}", time, e),
            )
        })?;
        if let Some(duration) = duration {
            totals.time_total = self.add(totals.time_total, duration.nanos(), &self.time_column)?;
            totals.time_count += 1;
        }
        trace!(?totals, "accumulated row");
        Ok(())
    }

    fn summary(&self, totals: &Totals) -> Row {
        let bytes = if totals.byte_count > 0 {
            ByteUnit::B.convert(totals.byte_total as f64, self.byte_output_unit)
        } else {
            0.0
        };
        let time = if totals.time_count > 0 {
            TimeUnit::Nanoseconds.convert(totals.time_total as f64, self.time_output_unit)
        } else {
            0.0
        };
        Row::new()
            .with(self.byte_total_column.clone(), bytes)
            .with(self.time_total_column.clone(), time)
    }
}

impl Directive for AggregateStats {
    fn define(&self) -> UsageSchema {
        UsageSchema::builder(NAME)
            .define("byte_column", TokenKind::ColumnName)
            .define("time_column", TokenKind::ColumnName)
            .define("byte_total_column", TokenKind::ColumnName)
            .define("time_total_column", TokenKind::ColumnName)
            .define_optional("byte_output_unit", TokenKind::Text)
            .define_optional("time_output_unit", TokenKind::Text)
            .build()
    }

    fn initialize(&mut self, args: &Arguments) -> Result<(), DirectiveError> {
        self.byte_column = args.column("byte_column")?.to_string();
        self.time_column = args.column("time_column")?.to_string();
        self.byte_total_column = args.column("byte_total_column")?.to_string();
        self.time_total_column = args.column("time_total_column")?.to_string();

        if args.contains("byte_output_unit") {
            let unit = args.text("byte_output_unit")?;
            self.byte_output_unit =
                ByteUnit::from_name(unit).ok_or_else(|| DirectiveError::Initialization {
                    directive: NAME.to_string(),
                    message: format!(
                        "Invalid byte unit '{}'. Valid units are: B, KB, MB, GB, TB, PB, EB, ZB, YB",
                        unit
                    ),
                })?;
        }

        if args.contains("time_output_unit") {
            let unit = args.text("time_output_unit")?;
            self.time_output_unit =
                time_unit_named(unit).ok_or_else(|| DirectiveError::Initialization {
                    directive: NAME.to_string(),
                    message: format!(
                        "Invalid time unit '{}'. Valid units are: ns, ms, s, m, h, d",
                        unit
                    ),
                })?;
        }

        debug!(
            byte_column = %self.byte_column,
            time_column = %self.time_column,
            byte_unit = %self.byte_output_unit,
            time_unit = %self.time_output_unit,
            "initialized aggregate-stats"
        );
        Ok(())
    }

    fn execute(
        &mut self,
        rows: Vec<Row>,
        ctx: &mut ExecutorContext,
    ) -> Result<Vec<Row>, DirectiveError> {
        let mut totals = Totals::load(&ctx.transient_store());
        for row in &rows {
            self.accumulate(row, &mut totals)?;
        }

        if ctx.is_final_batch() {
            let summary = self.summary(&totals);
            Totals::clear(&mut ctx.transient_store());
            debug!(
                bytes = totals.byte_total,
                nanos = totals.time_total,
                "emitting aggregate summary"
            );
            return Ok(vec![summary]);
        }

        totals.save(&mut ctx.transient_store());
        debug!(rows = rows.len(), "intermediate batch, totals pending");
        Ok(rows
            .into_iter()
            .map(|row| {
                row.with(self.byte_total_column.clone(), 0.0)
                    .with(self.time_total_column.clone(), 0.0)
            })
            .collect())
    }
}
