//! Movement decisions.
//!
//! Each stock-changing operation is a pure function of a registry snapshot, a
//! read-only view of the ledger, the request and a clock value. It returns a
//! [`Decision`]: the ledger rows and movement records to commit as one batch.
//! Nothing here performs IO; the caller commits the decision at the version it
//! read from.

use std::collections::HashMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockwise_core::{DomainError, DomainResult, EntryId, ItemId, LocationId, RecordId, TransferNo, WarehouseId};

use crate::ledger::{Action, EntryDraft, LedgerEntry, MovementType, Purpose, StockKey};
use crate::records::{
    AdjustmentRecord, MovementRecord, OutPurpose, StockInRecord, StockOutRecord, TransferRecord,
};
use crate::registry::RegistrySnapshot;
use crate::resolve::{EntityRef, Resolver};

/// Read access to ledger state needed by the decisions.
pub trait LedgerView {
    /// Signed balance of one exact triple.
    fn balance(&self, key: &StockKey) -> i64;

    fn entry(&self, id: &EntryId) -> Option<LedgerEntry>;
}

/// What to do when a stock-out takes more than the triple holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverdrawPolicy {
    /// Record the movement; the balance goes negative.
    #[default]
    Allow,
    /// Reject the whole batch with a conflict.
    Reject,
}

impl FromStr for OverdrawPolicy {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "allow" => Ok(OverdrawPolicy::Allow),
            "reject" => Ok(OverdrawPolicy::Reject),
            other => Err(DomainError::validation(format!(
                "unknown overdraw policy \"{other}\" (expected allow or reject)"
            ))),
        }
    }
}

/// A batch line that was not turned into a ledger row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedLine {
    pub index: usize,
    pub reason: String,
}

/// A stock-out line that took more than was available (accepted under `Allow`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Overdraw {
    pub key: StockKey,
    pub available: i64,
    pub requested: i64,
}

/// Everything one operation wants to commit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Decision {
    pub entries: Vec<LedgerEntry>,
    pub records: Vec<MovementRecord>,
    /// Demo `OUT` row whose `returned` flag flips to true in the same commit.
    pub close_demo: Option<EntryId>,
    pub skipped: Vec<SkippedLine>,
    /// Stock-in lines whose location reference did not resolve and were booked unracked.
    pub unracked: Vec<usize>,
    pub overdrawn: Vec<Overdraw>,
}

// ---------------------------------------------------------------------------
// Stock in
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockInLine {
    #[serde(default)]
    pub item: Option<EntityRef<ItemId>>,
    #[serde(default)]
    pub warehouse: Option<EntityRef<WarehouseId>>,
    #[serde(default)]
    pub location: Option<EntityRef<LocationId>>,
    #[serde(default)]
    pub quantity: Option<i64>,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub remarks: Option<String>,
}

/// Receipt of goods: a batch of lines with shared defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockIn {
    pub lines: Vec<StockInLine>,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub remarks: Option<String>,
}

pub fn decide_stock_in(registry: &RegistrySnapshot, request: &StockIn, now: DateTime<Utc>) -> DomainResult<Decision> {
    if request.lines.is_empty() {
        return Err(DomainError::validation("stock-in requires at least one line"));
    }

    let resolver = Resolver::new(registry);
    let mut decision = Decision::default();

    for (index, line) in request.lines.iter().enumerate() {
        let (key, quantity, unracked) = match resolve_in_line(&resolver, line) {
            Ok(resolved) => resolved,
            Err(reason) => {
                decision.skipped.push(SkippedLine { index, reason });
                continue;
            }
        };
        if unracked {
            decision.unracked.push(index);
        }

        let date = line.date.or(request.date).unwrap_or(now);
        let remarks = non_blank(line.remarks.as_deref())
            .or(non_blank(request.remarks.as_deref()))
            .unwrap_or_default();

        let entry = EntryDraft {
            key,
            action: Action::In,
            magnitude: quantity,
            movement_type: MovementType::In,
            purpose: None,
            remarks: remarks.clone(),
            date,
        }
        .into_entry(now);

        decision.records.push(MovementRecord::StockIn(StockInRecord {
            id: RecordId::new(),
            entry_id: entry.id,
            item_id: key.item_id,
            warehouse_id: key.warehouse_id,
            location_id: key.location_id,
            quantity,
            date,
            remarks,
        }));
        decision.entries.push(entry);
    }

    if decision.entries.is_empty() {
        return Err(nothing_accepted("stock-in", &decision.skipped));
    }
    Ok(decision)
}

/// Resolve one stock-in line to (triple, quantity, location-dropped).
fn resolve_in_line(resolver: &Resolver<'_>, line: &StockInLine) -> Result<(StockKey, i64, bool), String> {
    let item = present(&line.item).ok_or("missing item")?;
    let warehouse = present(&line.warehouse).ok_or("missing warehouse")?;
    let quantity = match line.quantity {
        Some(q) if q > 0 => q,
        Some(q) => return Err(format!("quantity must be positive, got {q}")),
        None => return Err("missing quantity".to_string()),
    };

    let item_id = resolver.item(item).map_err(|e| format!("item: {e}"))?;
    let warehouse_id = resolver.warehouse(warehouse).map_err(|e| format!("warehouse: {e}"))?;

    let (location_id, unracked) = match present(&line.location) {
        None => (None, false),
        Some(reference) => match resolver.location(warehouse_id, reference) {
            Ok(id) => (Some(id), false),
            Err(_) => (None, true),
        },
    };

    Ok((StockKey::new(item_id, warehouse_id, location_id), quantity, unracked))
}

/// Treat absent references and blank names alike.
fn present<I>(reference: &Option<EntityRef<I>>) -> Option<&EntityRef<I>> {
    match reference {
        Some(EntityRef::Name(name)) if name.trim().is_empty() => None,
        other => other.as_ref(),
    }
}

fn non_blank(s: Option<&str>) -> Option<String> {
    s.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

fn nothing_accepted(operation: &str, skipped: &[SkippedLine]) -> DomainError {
    let reasons = skipped
        .iter()
        .map(|s| format!("line {}: {}", s.index, s.reason))
        .collect::<Vec<_>>()
        .join("; ");
    DomainError::validation(format!("no valid {operation} lines ({reasons})"))
}

// ---------------------------------------------------------------------------
// Stock out
// ---------------------------------------------------------------------------

/// One line of a stock-out batch.
///
/// References are kept as raw strings and parsed per line, so a malformed id
/// skips its own line instead of failing the whole batch. A blank, `null` or
/// unparseable location means unracked stock.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockOutLine {
    #[serde(default)]
    pub item: Option<String>,
    #[serde(default)]
    pub warehouse: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub quantity: Option<i64>,
}

impl StockOutLine {
    pub fn new(key: StockKey, quantity: i64) -> Self {
        Self {
            item: Some(key.item_id.to_string()),
            warehouse: Some(key.warehouse_id.to_string()),
            location: key.location_id.map(|l| l.to_string()),
            quantity: Some(quantity),
        }
    }

    /// Parse the line's references into a stock triple.
    ///
    /// Item and warehouse must be valid ids; the error is the skip reason.
    pub fn key(&self) -> Result<StockKey, String> {
        let item: ItemId = required_id(self.item.as_deref(), "item")?;
        let warehouse: WarehouseId = required_id(self.warehouse.as_deref(), "warehouse")?;
        let location = id_text(self.location.as_deref()).and_then(|raw| raw.parse::<LocationId>().ok());
        Ok(StockKey::new(item, warehouse, location))
    }
}

/// Issue of goods for a sale or a demo.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockOut {
    pub lines: Vec<StockOutLine>,
    #[serde(default)]
    pub purpose: Option<OutPurpose>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub tender_no: Option<String>,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub return_date: Option<DateTime<Utc>>,
}

pub fn decide_stock_out(
    registry: &RegistrySnapshot,
    ledger: &impl LedgerView,
    request: &StockOut,
    policy: OverdrawPolicy,
    now: DateTime<Utc>,
) -> DomainResult<Decision> {
    if request.lines.is_empty() {
        return Err(DomainError::validation("stock-out requires at least one line"));
    }
    let purpose = request
        .purpose
        .ok_or_else(|| DomainError::validation("stock-out purpose is required (Sale or Demo)"))?;

    let date = request.date.unwrap_or(now);
    let reason = non_blank(request.reason.as_deref());
    let tender_no = non_blank(request.tender_no.as_deref());
    let return_date = match purpose {
        OutPurpose::Demo => request.return_date,
        OutPurpose::Sale => None,
    };

    let mut decision = Decision::default();
    // Quantity already taken from each triple by earlier lines of this batch.
    let mut taken: HashMap<StockKey, i64> = HashMap::new();

    for (index, line) in request.lines.iter().enumerate() {
        let (key, quantity) = match check_out_line(registry, line) {
            Ok(resolved) => resolved,
            Err(reason) => {
                decision.skipped.push(SkippedLine { index, reason });
                continue;
            }
        };

        let already = taken.entry(key).or_insert(0);
        let available = ledger.balance(&key) - *already;
        if quantity > available {
            match policy {
                OverdrawPolicy::Reject => {
                    return Err(DomainError::conflict(format!(
                        "insufficient stock for {key}. Available: {available}"
                    )));
                }
                OverdrawPolicy::Allow => decision.overdrawn.push(Overdraw {
                    key,
                    available,
                    requested: quantity,
                }),
            }
        }
        *already += quantity;

        let mut entry = EntryDraft {
            key,
            action: Action::Out,
            magnitude: quantity,
            movement_type: MovementType::Out,
            purpose: Some(match purpose {
                OutPurpose::Sale => Purpose::Sale,
                OutPurpose::Demo => Purpose::Demo,
            }),
            remarks: reason.clone().unwrap_or_default(),
            date,
        }
        .into_entry(now);
        if purpose == OutPurpose::Demo {
            entry.return_date = return_date;
            entry.returned = Some(false);
        }

        decision.records.push(MovementRecord::StockOut(StockOutRecord {
            id: RecordId::new(),
            entry_id: entry.id,
            item_id: key.item_id,
            warehouse_id: key.warehouse_id,
            location_id: key.location_id,
            quantity,
            purpose,
            date,
            return_date,
            reason: reason.clone(),
            tender_no: tender_no.clone(),
        }));
        decision.entries.push(entry);
    }

    if decision.entries.is_empty() {
        return Err(nothing_accepted("stock-out", &decision.skipped));
    }
    Ok(decision)
}

fn check_out_line(registry: &RegistrySnapshot, line: &StockOutLine) -> Result<(StockKey, i64), String> {
    let key = line.key()?;
    let quantity = match line.quantity {
        Some(q) if q > 0 => q,
        Some(q) => return Err(format!("quantity must be positive, got {q}")),
        None => return Err("missing quantity".to_string()),
    };
    registry.ensure_key(&key).map_err(|e| e.to_string())?;
    Ok((key, quantity))
}

/// Trimmed reference, or `None` when absent, blank or the literal `null`.
fn id_text(raw: Option<&str>) -> Option<&str> {
    match raw.map(str::trim) {
        None | Some("") | Some("null") => None,
        Some(v) => Some(v),
    }
}

fn required_id<T>(raw: Option<&str>, what: &str) -> Result<T, String>
where
    T: FromStr<Err = DomainError>,
{
    let raw = id_text(raw).ok_or_else(|| format!("missing {what}"))?;
    raw.parse().map_err(|e: DomainError| e.to_string())
}

// ---------------------------------------------------------------------------
// Transfer
// ---------------------------------------------------------------------------

/// Move stock from one (warehouse, rack) to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockTransfer {
    pub item: ItemId,
    pub quantity: i64,
    pub from_warehouse: WarehouseId,
    #[serde(default)]
    pub from_location: Option<LocationId>,
    pub to_warehouse: WarehouseId,
    #[serde(default)]
    pub to_location: Option<LocationId>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
}

impl StockTransfer {
    pub fn source(&self) -> StockKey {
        StockKey::new(self.item, self.from_warehouse, self.from_location)
    }

    pub fn destination(&self) -> StockKey {
        StockKey::new(self.item, self.to_warehouse, self.to_location)
    }
}

pub fn decide_transfer(
    registry: &RegistrySnapshot,
    ledger: &impl LedgerView,
    request: &StockTransfer,
    now: DateTime<Utc>,
) -> DomainResult<Decision> {
    if request.quantity <= 0 {
        return Err(DomainError::validation("transfer quantity must be positive"));
    }
    let source = request.source();
    let destination = request.destination();
    if source == destination {
        return Err(DomainError::validation(
            "source and destination must differ in warehouse or location",
        ));
    }
    registry.ensure_key(&source)?;
    registry.ensure_key(&destination)?;

    let available = ledger.balance(&source);
    if request.quantity > available {
        return Err(DomainError::conflict(format!("Insufficient stock. Available: {available}")));
    }

    let transfer_no = TransferNo::generate();
    let date = request.date.unwrap_or(now);
    let note = non_blank(request.note.as_deref()).unwrap_or_default();

    let leg = |key: StockKey, action: Action, movement_type: MovementType| {
        let mut entry = EntryDraft {
            key,
            action,
            magnitude: request.quantity,
            movement_type,
            purpose: Some(Purpose::Transferred),
            remarks: note.clone(),
            date,
        }
        .into_entry(now);
        entry.stock_transfer_no = Some(transfer_no.clone());
        entry
    };

    let entries = vec![
        leg(source, Action::Out, MovementType::TransferOut),
        leg(destination, Action::In, MovementType::TransferIn),
    ];

    let record = TransferRecord {
        id: RecordId::new(),
        transfer_no: transfer_no.clone(),
        item_id: request.item,
        quantity: request.quantity,
        from_warehouse_id: source.warehouse_id,
        from_location_id: source.location_id,
        to_warehouse_id: destination.warehouse_id,
        to_location_id: destination.location_id,
        note,
        transfer_date: date,
    };

    Ok(Decision {
        entries,
        records: vec![MovementRecord::Transfer(record)],
        ..Decision::default()
    })
}

// ---------------------------------------------------------------------------
// Adjustment
// ---------------------------------------------------------------------------

/// Manual correction of one triple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockAdjustment {
    pub item: ItemId,
    pub warehouse: WarehouseId,
    #[serde(default)]
    pub location: Option<LocationId>,
    pub quantity: i64,
    pub action: Action,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
}

pub fn decide_adjustment(
    registry: &RegistrySnapshot,
    request: &StockAdjustment,
    now: DateTime<Utc>,
) -> DomainResult<Decision> {
    if request.quantity <= 0 {
        return Err(DomainError::validation("adjustment quantity must be positive"));
    }
    let reason = non_blank(Some(&request.reason))
        .ok_or_else(|| DomainError::validation("adjustment reason is required"))?;
    let key = StockKey::new(request.item, request.warehouse, request.location);
    registry.ensure_key(&key)?;

    let date = request.date.unwrap_or(now);
    let entry = EntryDraft {
        key,
        action: request.action,
        magnitude: request.quantity,
        movement_type: MovementType::Adjustment,
        purpose: Some(Purpose::Adjusted),
        remarks: reason.clone(),
        date,
    }
    .into_entry(now);

    let record = AdjustmentRecord {
        id: RecordId::new(),
        entry_id: entry.id,
        item_id: key.item_id,
        warehouse_id: key.warehouse_id,
        location_id: key.location_id,
        quantity: request.quantity,
        action: request.action,
        reason,
        date,
    };

    Ok(Decision {
        entries: vec![entry],
        records: vec![MovementRecord::Adjustment(record)],
        ..Decision::default()
    })
}

// ---------------------------------------------------------------------------
// Demo return
// ---------------------------------------------------------------------------

pub const DEMO_RETURN_REMARKS: &str = "Returned from demo";

/// Close a pending demo: flip `returned` and book the stock back in.
pub fn decide_demo_return(ledger: &impl LedgerView, entry_id: EntryId, now: DateTime<Utc>) -> DomainResult<Decision> {
    let original = ledger
        .entry(&entry_id)
        .ok_or_else(|| DomainError::not_found(format!("ledger entry {entry_id}")))?;

    if !original.is_demo_out() {
        return Err(DomainError::conflict(format!("entry {entry_id} is not a demo stock-out")));
    }
    if original.returned == Some(true) {
        return Err(DomainError::conflict(format!("demo entry {entry_id} is already returned")));
    }

    let mut entry = EntryDraft {
        key: original.key(),
        action: Action::In,
        magnitude: original.quantity.abs(),
        movement_type: MovementType::ReturnIn,
        purpose: Some(Purpose::DemoReturn),
        remarks: DEMO_RETURN_REMARKS.to_string(),
        date: now,
    }
    .into_entry(now);
    entry.reference_id = Some(entry_id);

    Ok(Decision {
        entries: vec![entry],
        close_demo: Some(entry_id),
        ..Decision::default()
    })
}
