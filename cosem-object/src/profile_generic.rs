//! Profile Generic interface class (class id 7).
//!
//! A buffer of captured rows, one column per configured capture object,
//! used for load profiles and event logs. Rows are appended in capture
//! order; at the configured capacity the oldest row is evicted first.
//! Reads of the buffer attribute honour the range-by-timestamp and
//! range-by-entry selectors.
//!
//! Attributes: 1 logical_name, 2 buffer, 3 capture_objects,
//! 4 capture_period, 5 sort_method, 6 sort_object, 7 entries_in_use,
//! 8 profile_entries.
//! Methods: 1 reset, 2 capture.

use crate::collection::ObjectCollection;
use crate::descriptor::CaptureObjectDefinition;
use crate::object::{CosemObject, InterfaceClass, ObjectCore};
use crate::selective::SelectiveAccess;
use crate::storage::{MemoryBuffer, ProfileBuffer, Row};
use async_trait::async_trait;
use cosem_core::{CosemDateTime, CosemError, CosemResult, ObisCode, Value, ValueKind};
use tokio::sync::{Mutex, RwLock};

/// Buffer ordering, per the profile sort_method enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortMethod {
    Fifo,
    Lifo,
}

impl SortMethod {
    pub fn code(&self) -> u8 {
        match self {
            SortMethod::Fifo => 1,
            SortMethod::Lifo => 2,
        }
    }

    pub fn from_code(code: u8) -> CosemResult<Self> {
        match code {
            1 => Ok(SortMethod::Fifo),
            2 => Ok(SortMethod::Lifo),
            other => Err(CosemError::InvalidData(format!(
                "unsupported sort method {other}"
            ))),
        }
    }
}

/// Everything the capture/read race touches, guarded by one mutex:
/// capture runs from a periodic task while buffer reads arrive from the
/// client connection, and the two must not interleave.
struct BufferState {
    capture_objects: Vec<CaptureObjectDefinition>,
    /// Wire kind per column; `DontCare` until declared or inferred from
    /// the first captured value, then stable so repeated encodes agree.
    column_kinds: Vec<ValueKind>,
    buffer: Box<dyn ProfileBuffer>,
    entries_in_use: u32,
}

impl std::fmt::Debug for BufferState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferState")
            .field("capture_objects", &self.capture_objects)
            .field("column_kinds", &self.column_kinds)
            .field("rows", &self.buffer.len())
            .field("entries_in_use", &self.entries_in_use)
            .finish()
    }
}

#[derive(Debug)]
pub struct ProfileGeneric {
    core: ObjectCore,
    state: Mutex<BufferState>,
    capture_period: RwLock<u32>,
    sort_method: RwLock<SortMethod>,
    sort_object: RwLock<Option<CaptureObjectDefinition>>,
    /// Row capacity; 0 means unbounded.
    profile_entries: RwLock<u32>,
}

impl ProfileGeneric {
    pub const ATTRIBUTE_COUNT: u8 = 8;
    pub const METHOD_COUNT: u8 = 2;

    pub const ATTR_BUFFER: u8 = 2;
    pub const ATTR_CAPTURE_OBJECTS: u8 = 3;

    pub const METHOD_RESET: u8 = 1;
    pub const METHOD_CAPTURE: u8 = 2;

    /// The conventional load-profile name 1-0:99.1.0.255.
    pub fn default_name() -> ObisCode {
        ObisCode::new(1, 0, 99, 1, 0, 255)
    }

    pub fn new(
        logical_name: ObisCode,
        profile_entries: u32,
        capture_period: u32,
        buffer: Box<dyn ProfileBuffer>,
    ) -> Self {
        Self {
            core: ObjectCore::new(InterfaceClass::ProfileGeneric, 1, Some(logical_name)),
            state: Mutex::new(BufferState {
                capture_objects: Vec::new(),
                column_kinds: Vec::new(),
                buffer,
                entries_in_use: 0,
            }),
            capture_period: RwLock::new(capture_period),
            sort_method: RwLock::new(SortMethod::Fifo),
            sort_object: RwLock::new(None),
            profile_entries: RwLock::new(profile_entries),
        }
    }

    /// A profile backed by the in-memory store.
    pub fn with_memory_buffer(logical_name: ObisCode, profile_entries: u32) -> Self {
        Self::new(
            logical_name,
            profile_entries,
            900,
            Box::new(MemoryBuffer::new()),
        )
    }

    pub async fn capture_objects(&self) -> Vec<CaptureObjectDefinition> {
        self.state.lock().await.capture_objects.clone()
    }

    /// Replace the capture-object list. Rows captured under the old column
    /// set are structurally meaningless against the new one, so the buffer
    /// and the entries counter are cleared rather than kept or errored.
    pub async fn set_capture_objects(&self, definitions: Vec<CaptureObjectDefinition>) {
        let mut state = self.state.lock().await;
        state.column_kinds = vec![ValueKind::DontCare; definitions.len()];
        state.capture_objects = definitions;
        state.buffer.clear();
        state.entries_in_use = 0;
        log::debug!("capture objects replaced, buffer cleared");
    }

    pub async fn entries_in_use(&self) -> u32 {
        self.state.lock().await.entries_in_use
    }

    pub async fn capture_period(&self) -> u32 {
        *self.capture_period.read().await
    }

    pub async fn profile_entries(&self) -> u32 {
        *self.profile_entries.read().await
    }

    /// Clear the buffer.
    pub async fn reset(&self) {
        let mut state = self.state.lock().await;
        state.buffer.clear();
        state.entries_in_use = 0;
    }

    /// Sample every capture object from `sources` into one new row.
    ///
    /// Values are read server-locally (no wire encoding). A missing target
    /// object or an out-of-range data index yields a Null cell rather than
    /// failing the row. At capacity the oldest row is evicted first.
    pub async fn capture(&self, sources: &ObjectCollection) -> CosemResult<()> {
        // Snapshot the column set, then read outside the buffer lock so a
        // capture object can never deadlock against this profile's own
        // attributes.
        let definitions = self.capture_objects().await;
        if definitions.is_empty() {
            return Err(CosemError::InvalidData(
                "no capture objects configured".into(),
            ));
        }

        let mut row: Row = Vec::with_capacity(definitions.len());
        let mut declared = Vec::with_capacity(definitions.len());
        for definition in &definitions {
            let (cell, kind) = Self::read_capture_cell(sources, definition).await;
            row.push(cell);
            declared.push(kind);
        }

        let capacity = self.profile_entries().await;
        let mut state = self.state.lock().await;
        if state.capture_objects != definitions {
            // A reconfiguration raced this capture; the row no longer
            // matches the column set.
            log::warn!("capture dropped: capture objects changed mid-flight");
            return Ok(());
        }

        for (i, cell) in row.iter_mut().enumerate() {
            if state.column_kinds[i] == ValueKind::DontCare {
                state.column_kinds[i] = if declared[i] != ValueKind::DontCare {
                    declared[i]
                } else if !cell.is_null() {
                    ValueKind::infer_from(cell)
                } else {
                    ValueKind::DontCare
                };
            }
            *cell = coerce_cell(cell.clone(), state.column_kinds[i]);
        }

        if capacity > 0 && state.buffer.len() as u32 >= capacity {
            state.buffer.evict_oldest();
            state.entries_in_use = state.entries_in_use.saturating_sub(1);
        }
        state.buffer.append(row);
        state.entries_in_use += 1;
        Ok(())
    }

    async fn read_capture_cell(
        sources: &ObjectCollection,
        definition: &CaptureObjectDefinition,
    ) -> (Value, ValueKind) {
        let Some(object) = sources.find(&definition.logical_name) else {
            log::warn!("capture object {} not found", definition.logical_name);
            return (Value::Null, ValueKind::DontCare);
        };
        if object.interface_class().class_id() != definition.class_id {
            log::warn!(
                "capture object {} has class {}, expected {}",
                definition.logical_name,
                object.interface_class().class_id(),
                definition.class_id
            );
            return (Value::Null, ValueKind::DontCare);
        }
        let declared = object
            .core()
            .attribute(definition.attribute_index)
            .await
            .effective_kind();
        let value = match object.get_attribute(definition.attribute_index, None).await {
            Ok(value) => value,
            Err(e) => {
                log::warn!("capture read of {definition} failed: {e}");
                return (Value::Null, declared);
            }
        };
        let cell = if definition.data_index == 0 {
            value
        } else {
            match &value {
                Value::Structure(items) | Value::Array(items) => items
                    .get(definition.data_index as usize - 1)
                    .cloned()
                    .unwrap_or(Value::Null),
                _ => Value::Null,
            }
        };
        (cell, declared)
    }

    /// Rows selected by the access descriptor, as the wire ARRAY of
    /// STRUCTUREs.
    async fn buffer_value(&self, access: Option<&SelectiveAccess>) -> CosemResult<Value> {
        let state = self.state.lock().await;
        let rows = match access {
            None => state.buffer.all(),
            Some(SelectiveAccess::Entry { start, count }) => {
                state.buffer.range(*start as usize, *count as usize)
            }
            Some(SelectiveAccess::Range { from, to, .. }) => state
                .buffer
                .all()
                .into_iter()
                .filter(|row| row_in_range(row, from, to))
                .collect(),
        };
        let encoded = rows.into_iter().map(Value::Structure).collect();
        Ok(Value::Array(encoded))
    }

    async fn apply_capture_object_value(&self, value: &Value) -> CosemResult<()> {
        let mut definitions = Vec::new();
        for entry in value.as_array()? {
            definitions.push(CaptureObjectDefinition::from_value(entry)?);
        }
        self.set_capture_objects(definitions).await;
        Ok(())
    }

    async fn set_profile_entries(&self, capacity: u32) {
        *self.profile_entries.write().await = capacity;
        if capacity == 0 {
            return;
        }
        let mut state = self.state.lock().await;
        while state.buffer.len() as u32 > capacity {
            state.buffer.evict_oldest();
            state.entries_in_use = state.entries_in_use.saturating_sub(1);
        }
    }
}

/// A row matches a timestamp range when its first column carries a
/// date-time (raw or as a 12-byte octet string) inside `[from, to]`.
fn row_in_range(row: &Row, from: &CosemDateTime, to: &CosemDateTime) -> bool {
    let Some(first) = row.first() else {
        return false;
    };
    let stamp = match first {
        Value::DateTime(dt) => *dt,
        Value::OctetString(bytes) => match CosemDateTime::decode(bytes) {
            Ok(dt) => dt,
            Err(_) => return false,
        },
        _ => return false,
    };
    let key = stamp.sort_key();
    key >= from.sort_key() && key <= to.sort_key()
}

/// Best-effort re-typing of a cell onto its recorded column kind so every
/// encode of the column uses one wire type.
fn coerce_cell(cell: Value, kind: ValueKind) -> Value {
    if kind == ValueKind::DontCare || cell.kind() == kind || cell.is_null() {
        return cell;
    }
    match (&cell, kind) {
        (Value::OctetString(bytes), ValueKind::DateTime) => match CosemDateTime::decode(bytes) {
            Ok(dt) => Value::DateTime(dt),
            Err(_) => cell,
        },
        (Value::DateTime(dt), ValueKind::OctetString) => {
            Value::OctetString(dt.encode().to_vec())
        }
        _ if cell.is_numeric() && kind.is_numeric() => match cell.to_i64() {
            Ok(wide) => renumber(wide, kind).unwrap_or(cell),
            Err(_) => cell,
        },
        _ => cell,
    }
}

fn renumber(value: i64, kind: ValueKind) -> Option<Value> {
    Some(match kind {
        ValueKind::Integer8 => Value::Integer8(i8::try_from(value).ok()?),
        ValueKind::Integer16 => Value::Integer16(i16::try_from(value).ok()?),
        ValueKind::Integer32 => Value::Integer32(i32::try_from(value).ok()?),
        ValueKind::Integer64 => Value::Integer64(value),
        ValueKind::Unsigned8 => Value::Unsigned8(u8::try_from(value).ok()?),
        ValueKind::Unsigned16 => Value::Unsigned16(u16::try_from(value).ok()?),
        ValueKind::Unsigned32 => Value::Unsigned32(u32::try_from(value).ok()?),
        ValueKind::Unsigned64 => Value::Unsigned64(u64::try_from(value).ok()?),
        ValueKind::Enum => Value::Enum(u8::try_from(value).ok()?),
        _ => return None,
    })
}

#[async_trait]
impl CosemObject for ProfileGeneric {
    fn core(&self) -> &ObjectCore {
        &self.core
    }

    fn attribute_count(&self) -> u8 {
        Self::ATTRIBUTE_COUNT
    }

    fn method_count(&self) -> u8 {
        Self::METHOD_COUNT
    }

    async fn get_attribute(
        &self,
        index: u8,
        access: Option<&SelectiveAccess>,
    ) -> CosemResult<Value> {
        self.core.check_attribute_index(index, self.attribute_count())?;
        match index {
            1 => Ok(self.core.logical_name_value().await),
            Self::ATTR_BUFFER => self.buffer_value(access).await,
            Self::ATTR_CAPTURE_OBJECTS => {
                let definitions = self.capture_objects().await;
                Value::array(definitions.iter().map(|d| d.to_value()).collect())
            }
            4 => Ok(Value::Unsigned32(self.capture_period().await)),
            5 => Ok(Value::Enum(self.sort_method.read().await.code())),
            6 => Ok(match &*self.sort_object.read().await {
                Some(definition) => definition.to_value(),
                None => Value::Null,
            }),
            7 => Ok(Value::Unsigned32(self.entries_in_use().await)),
            _ => Ok(Value::Unsigned32(self.profile_entries().await)),
        }
    }

    async fn set_attribute(&self, index: u8, value: Value) -> CosemResult<()> {
        self.core.check_attribute_index(index, self.attribute_count())?;
        match index {
            1 => self.core.apply_logical_name_value(&value).await,
            Self::ATTR_BUFFER => Err(CosemError::AccessDenied(
                "the buffer is written by capture only".into(),
            )),
            Self::ATTR_CAPTURE_OBJECTS => self.apply_capture_object_value(&value).await,
            4 => {
                let period = value.to_i64()?;
                let period = u32::try_from(period).map_err(|_| {
                    CosemError::InvalidData(format!("capture period {period} out of range"))
                })?;
                *self.capture_period.write().await = period;
                Ok(())
            }
            5 => {
                *self.sort_method.write().await = SortMethod::from_code(value.as_u8()?)?;
                Ok(())
            }
            6 => {
                *self.sort_object.write().await = match &value {
                    Value::Null => None,
                    other => Some(CaptureObjectDefinition::from_value(other)?),
                };
                Ok(())
            }
            7 => Err(CosemError::AccessDenied(
                "entries_in_use is maintained by the buffer".into(),
            )),
            _ => {
                let capacity = value.to_i64()?;
                if capacity < 0 {
                    return Err(CosemError::InvalidData(format!(
                        "profile_entries must be >= 0, got {capacity}"
                    )));
                }
                self.set_profile_entries(capacity as u32).await;
                Ok(())
            }
        }
    }

    async fn invoke(&self, index: u8, _parameters: Option<Value>) -> CosemResult<Option<Value>> {
        self.core.check_method_index(index, self.method_count())?;
        match index {
            Self::METHOD_RESET => {
                self.reset().await;
                Ok(None)
            }
            _ => Err(CosemError::Protocol(
                "capture needs the owning collection; invoke it through the dispatcher".into(),
            )),
        }
    }

    async fn invoke_with_collection(
        &self,
        index: u8,
        _parameters: Option<Value>,
        collection: &ObjectCollection,
    ) -> CosemResult<Option<Value>> {
        self.core.check_method_index(index, self.method_count())?;
        match index {
            Self::METHOD_RESET => self.reset().await,
            _ => self.capture(collection).await?,
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::Clock;
    use crate::data::Data;
    use crate::register::Register;
    use crate::scaler_unit::{units, ScalerUnit};
    use std::sync::Arc;

    fn counter_name() -> ObisCode {
        ObisCode::new(1, 0, 1, 8, 0, 255)
    }

    async fn sources_with_counter() -> (ObjectCollection, Arc<Data>) {
        let mut sources = ObjectCollection::new();
        let counter = Arc::new(Data::new(counter_name(), Value::Unsigned32(0)));
        sources.register(counter.clone()).await.unwrap();
        (sources, counter)
    }

    fn counter_profile(profile_entries: u32) -> ProfileGeneric {
        ProfileGeneric::with_memory_buffer(ProfileGeneric::default_name(), profile_entries)
    }

    async fn configure_counter_column(profile: &ProfileGeneric) {
        profile
            .set_capture_objects(vec![CaptureObjectDefinition::new(1, counter_name(), 2)])
            .await;
    }

    fn first_cell(buffer: &Value, row: usize) -> &Value {
        &buffer.as_array().unwrap()[row].as_structure().unwrap()[0]
    }

    #[tokio::test]
    async fn entry_selector_pages_and_clamps() {
        let (sources, counter) = sources_with_counter().await;
        let profile = counter_profile(0);
        configure_counter_column(&profile).await;

        for n in 0..10_000u32 {
            counter.set_value(Value::Unsigned32(n)).await;
            profile.capture(&sources).await.unwrap();
        }
        assert_eq!(profile.entries_in_use().await, 10_000);

        let page = profile
            .get_attribute(2, Some(&SelectiveAccess::Entry { start: 0, count: 50 }))
            .await
            .unwrap();
        assert_eq!(page.as_array().unwrap().len(), 50);
        assert_eq!(first_cell(&page, 0), &Value::Unsigned32(0));
        assert_eq!(first_cell(&page, 49), &Value::Unsigned32(49));

        let tail = profile
            .get_attribute(
                2,
                Some(&SelectiveAccess::Entry {
                    start: 9_990,
                    count: 50,
                }),
            )
            .await
            .unwrap();
        assert_eq!(tail.as_array().unwrap().len(), 10);
        assert_eq!(first_cell(&tail, 9), &Value::Unsigned32(9_999));
    }

    #[tokio::test]
    async fn capacity_eviction_is_fifo() {
        let (sources, counter) = sources_with_counter().await;
        let profile = counter_profile(100);
        configure_counter_column(&profile).await;

        for n in 0..101u32 {
            counter.set_value(Value::Unsigned32(n)).await;
            profile.capture(&sources).await.unwrap();
        }
        assert_eq!(profile.entries_in_use().await, 100);
        let buffer = profile.get_attribute(2, None).await.unwrap();
        assert_eq!(buffer.as_array().unwrap().len(), 100);
        // Row 0 (value 0) was evicted; the buffer now starts at 1.
        assert_eq!(first_cell(&buffer, 0), &Value::Unsigned32(1));
        assert_eq!(first_cell(&buffer, 99), &Value::Unsigned32(100));
    }

    #[tokio::test]
    async fn reconfiguration_clears_the_buffer() {
        let (sources, counter) = sources_with_counter().await;
        let profile = counter_profile(0);
        configure_counter_column(&profile).await;
        for n in 0..5u32 {
            counter.set_value(Value::Unsigned32(n)).await;
            profile.capture(&sources).await.unwrap();
        }
        assert_eq!(profile.entries_in_use().await, 5);

        let new_list = Value::Array(vec![
            CaptureObjectDefinition::new(1, counter_name(), 2).to_value(),
            CaptureObjectDefinition::new(1, counter_name(), 1).to_value(),
        ]);
        profile.set_attribute(3, new_list).await.unwrap();

        assert_eq!(profile.entries_in_use().await, 0);
        let buffer = profile.get_attribute(2, None).await.unwrap();
        assert!(buffer.as_array().unwrap().is_empty());
        assert_eq!(profile.capture_objects().await.len(), 2);
    }

    #[tokio::test]
    async fn timestamp_range_selects_inclusively() {
        let mut sources = ObjectCollection::new();
        let clock = Arc::new(Clock::new(
            Clock::default_name(),
            CosemDateTime::new(2026, 8, 8, 0, 0, 0, 60, &[]).unwrap(),
            60,
        ));
        let register = Arc::new(Register::new(
            counter_name(),
            Value::Unsigned32(0),
            ScalerUnit::new(0, units::WATT_HOUR),
        ));
        sources.register(clock.clone()).await.unwrap();
        sources.register(register.clone()).await.unwrap();

        let profile = counter_profile(0);
        profile
            .set_capture_objects(vec![
                CaptureObjectDefinition::new(8, Clock::default_name(), 2),
                CaptureObjectDefinition::new(3, counter_name(), 2),
            ])
            .await;

        // One capture per hour.
        for hour in 0..24u8 {
            clock
                .set_time(CosemDateTime::new(2026, 8, 8, hour, 0, 0, 60, &[]).unwrap())
                .await;
            register.set_value(Value::Unsigned32(hour as u32)).await.unwrap();
            profile.capture(&sources).await.unwrap();
        }

        let access = SelectiveAccess::Range {
            restricting: CaptureObjectDefinition::new(8, Clock::default_name(), 2),
            from: CosemDateTime::new(2026, 8, 8, 6, 0, 0, 60, &[]).unwrap(),
            to: CosemDateTime::new(2026, 8, 8, 9, 0, 0, 60, &[]).unwrap(),
        };
        let selected = profile.get_attribute(2, Some(&access)).await.unwrap();
        let rows = selected.as_array().unwrap();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].as_structure().unwrap()[1], Value::Unsigned32(6));
        assert_eq!(rows[3].as_structure().unwrap()[1], Value::Unsigned32(9));
    }

    #[tokio::test]
    async fn data_index_picks_a_structure_element() {
        let mut sources = ObjectCollection::new();
        let register = Arc::new(Register::new(
            counter_name(),
            Value::Unsigned32(0),
            ScalerUnit::new(3, units::WATT_HOUR),
        ));
        sources.register(register).await.unwrap();

        let profile = counter_profile(0);
        // Column samples the unit element of the scaler_unit structure.
        profile
            .set_capture_objects(vec![
                CaptureObjectDefinition::new(3, counter_name(), 3).with_data_index(2),
            ])
            .await;
        profile.capture(&sources).await.unwrap();

        let buffer = profile.get_attribute(2, None).await.unwrap();
        assert_eq!(first_cell(&buffer, 0), &Value::Enum(units::WATT_HOUR));
    }

    #[tokio::test]
    async fn missing_capture_object_yields_null_cell() {
        let (sources, _) = sources_with_counter().await;
        let profile = counter_profile(0);
        profile
            .set_capture_objects(vec![
                CaptureObjectDefinition::new(1, counter_name(), 2),
                CaptureObjectDefinition::new(1, ObisCode::new(9, 9, 9, 9, 9, 9), 2),
            ])
            .await;
        profile.capture(&sources).await.unwrap();
        let buffer = profile.get_attribute(2, None).await.unwrap();
        let row = buffer.as_array().unwrap()[0].as_structure().unwrap();
        assert_eq!(row[0], Value::Unsigned32(0));
        assert_eq!(row[1], Value::Null);
    }

    #[tokio::test]
    async fn column_kind_recorded_from_first_capture() {
        let (sources, counter) = sources_with_counter().await;
        let profile = counter_profile(0);
        configure_counter_column(&profile).await;

        counter.set_value(Value::Unsigned32(1)).await;
        profile.capture(&sources).await.unwrap();
        // The source changes runtime kind; the column keeps the first one.
        counter.set_value(Value::Unsigned16(2)).await;
        profile.capture(&sources).await.unwrap();

        let buffer = profile.get_attribute(2, None).await.unwrap();
        assert_eq!(first_cell(&buffer, 0).kind(), ValueKind::Unsigned32);
        assert_eq!(first_cell(&buffer, 1).kind(), ValueKind::Unsigned32);
        assert_eq!(first_cell(&buffer, 1), &Value::Unsigned32(2));
    }

    #[tokio::test]
    async fn buffer_attribute_is_read_only() {
        let profile = counter_profile(0);
        let err = profile
            .set_attribute(2, Value::Array(vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, CosemError::AccessDenied(_)));
        let err = profile
            .set_attribute(7, Value::Unsigned32(1))
            .await
            .unwrap_err();
        assert!(matches!(err, CosemError::AccessDenied(_)));
    }

    #[tokio::test]
    async fn shrinking_profile_entries_evicts_oldest() {
        let (sources, counter) = sources_with_counter().await;
        let profile = counter_profile(0);
        configure_counter_column(&profile).await;
        for n in 0..10u32 {
            counter.set_value(Value::Unsigned32(n)).await;
            profile.capture(&sources).await.unwrap();
        }
        profile.set_attribute(8, Value::Unsigned32(4)).await.unwrap();
        assert_eq!(profile.entries_in_use().await, 4);
        let buffer = profile.get_attribute(2, None).await.unwrap();
        assert_eq!(first_cell(&buffer, 0), &Value::Unsigned32(6));
    }

    #[tokio::test]
    async fn eviction_goes_through_the_storage_port() {
        use crate::storage::MockProfileBuffer;

        let mut mock = MockProfileBuffer::new();
        mock.expect_clear().times(1).return_const(());
        // Already at the 2-row capacity: capture must evict before append.
        mock.expect_len().return_const(2usize);
        mock.expect_evict_oldest().times(1).return_const(());
        mock.expect_append().times(1).return_const(());

        let (sources, _) = sources_with_counter().await;
        let profile = ProfileGeneric::new(
            ProfileGeneric::default_name(),
            2,
            900,
            Box::new(mock),
        );
        configure_counter_column(&profile).await;
        profile.capture(&sources).await.unwrap();
    }

    #[tokio::test]
    async fn reset_method_clears() {
        let (sources, _) = sources_with_counter().await;
        let profile = counter_profile(0);
        configure_counter_column(&profile).await;
        profile.capture(&sources).await.unwrap();
        assert_eq!(profile.entries_in_use().await, 1);

        profile.invoke(ProfileGeneric::METHOD_RESET, None).await.unwrap();
        assert_eq!(profile.entries_in_use().await, 0);
    }

    #[tokio::test]
    async fn capture_method_goes_through_the_collection() {
        let (sources, _) = sources_with_counter().await;
        let profile = counter_profile(0);
        configure_counter_column(&profile).await;

        profile
            .invoke_with_collection(ProfileGeneric::METHOD_CAPTURE, None, &sources)
            .await
            .unwrap();
        assert_eq!(profile.entries_in_use().await, 1);
        // Without the collection in reach the capture method is refused.
        assert!(profile.invoke(ProfileGeneric::METHOD_CAPTURE, None).await.is_err());
    }

    #[tokio::test]
    async fn concurrent_capture_and_read() {
        let (sources, counter) = sources_with_counter().await;
        let sources = Arc::new(sources);
        let profile = Arc::new(counter_profile(0));
        configure_counter_column(&profile).await;

        let writer = {
            let profile = profile.clone();
            let sources = sources.clone();
            tokio::spawn(async move {
                for n in 0..500u32 {
                    counter.set_value(Value::Unsigned32(n)).await;
                    profile.capture(&sources).await.unwrap();
                }
            })
        };
        let reader = {
            let profile = profile.clone();
            tokio::spawn(async move {
                for _ in 0..200 {
                    let buffer = profile.get_attribute(2, None).await.unwrap();
                    // Every observed row is complete: one cell per column.
                    for row in buffer.as_array().unwrap() {
                        assert_eq!(row.as_structure().unwrap().len(), 1);
                    }
                }
            })
        };
        writer.await.unwrap();
        reader.await.unwrap();
        assert_eq!(profile.entries_in_use().await, 500);
    }
}
