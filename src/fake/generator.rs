// Fake instance generator for schemaforge
//
// Walks the same type descriptor graph as the schema builder and synthesizes
// one conforming value per node. Generation consumes entropy only from the
// supplied random source, so a fixed seed reproduces the same instance.
//
// Self-reference cannot be cut with a back-reference here (a value is needed),
// so the generator tracks the chain of records being generated and resolves a
// reference beyond `max_self_reference_depth` to its terminal case.

use std::collections::{BTreeMap, HashMap};

use bytes::Bytes;
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use log::{debug, trace};
use rand::distributions::Alphanumeric;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_core::RngCore;

use crate::fake::config::GeneratorConfig;
use crate::internal::error::{Error, Result};
use crate::schema::registry::RecordRegistry;
use crate::schema::types::{LogicalType, PrimitiveKind, TypeDescriptor};
use crate::schema::value::{Decimal, Instance, Value};

/// Length of generated map keys
const MAP_KEY_LENGTH: usize = 10;

/// Placeholder record name for values generated outside any record
const DETACHED: &str = "<value>";

/// Where in the record graph a value is being generated
#[derive(Clone, Copy)]
struct Site<'a> {
    record: &'a str,
    field: Option<&'a str>,
}

impl Site<'_> {
    fn error(&self, reason: impl Into<String>) -> Error {
        Error::generation(self.record, self.field, reason)
    }
}

/// State of one top-level generation
#[derive(Default)]
struct Walk {
    /// Records currently being generated, outermost first
    chain: Vec<String>,
    /// Current descriptor nesting depth
    depth: usize,
}

impl Walk {
    fn occurrences(&self, name: &str) -> usize {
        self.chain.iter().filter(|n| n.as_str() == name).count()
    }
}

/// Generator of fake record instances
pub struct FakeGenerator<'r, R: RngCore> {
    registry: &'r RecordRegistry,
    config: GeneratorConfig,
    rng: R,
}

impl<'r> FakeGenerator<'r, StdRng> {
    /// Creates a generator whose output is fully determined by `seed`
    pub fn seeded(registry: &'r RecordRegistry, seed: u64) -> Self {
        Self::new(registry, StdRng::seed_from_u64(seed))
    }

    /// Creates a generator seeded from operating system entropy
    pub fn from_entropy(registry: &'r RecordRegistry) -> Self {
        Self::new(registry, StdRng::from_entropy())
    }
}

impl<'r, R: RngCore> FakeGenerator<'r, R> {
    /// Creates a generator with default configuration
    pub fn new(registry: &'r RecordRegistry, rng: R) -> Self {
        Self::with_config(registry, rng, GeneratorConfig::default())
    }

    /// Creates a generator with custom configuration
    pub fn with_config(registry: &'r RecordRegistry, rng: R, config: GeneratorConfig) -> Self {
        Self { registry, config, rng }
    }

    /// Returns the active configuration
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Replaces the configuration; the random source keeps its state
    pub fn set_config(&mut self, config: GeneratorConfig) {
        self.config = config;
    }

    /// Generates one instance of `record_name`.
    ///
    /// Fields named in `overrides` take the supplied value unchanged; only the
    /// outermost record's fields can be overridden.
    pub fn generate(&mut self, record_name: &str, overrides: &HashMap<String, Value>) -> Result<Instance> {
        self.config
            .validate()
            .map_err(|reason| Error::generation(record_name, None, format!("invalid generator configuration: {}", reason)))?;

        let record = self.registry.resolve(record_name)?;
        let mut unknown: Vec<&String> = overrides.keys().filter(|k| record.field(k).is_none()).collect();
        unknown.sort();
        if let Some(name) = unknown.first() {
            return Err(Error::generation(
                record_name,
                Some(name.as_str()),
                "override does not name a field of the record",
            ));
        }

        let mut walk = Walk::default();
        let instance = self.generate_record(record_name, Some(overrides), &mut walk)?;
        debug!(
            "Generated '{}' with {} override(s)",
            record_name,
            overrides.len()
        );
        Ok(instance)
    }

    /// Generates `count` instances of `record_name` with the same overrides
    pub fn generate_many(
        &mut self,
        record_name: &str,
        overrides: &HashMap<String, Value>,
        count: usize,
    ) -> Result<Vec<Instance>> {
        (0..count).map(|_| self.generate(record_name, overrides)).collect()
    }

    /// Generates a value for a single descriptor outside any record
    pub fn generate_value(&mut self, descriptor: &TypeDescriptor) -> Result<Value> {
        self.config
            .validate()
            .map_err(|reason| Error::generation(DETACHED, None, format!("invalid generator configuration: {}", reason)))?;
        let site = Site {
            record: DETACHED,
            field: None,
        };
        self.generate_type(descriptor, site, &mut Walk::default())
    }

    fn generate_record(
        &mut self,
        name: &str,
        overrides: Option<&HashMap<String, Value>>,
        walk: &mut Walk,
    ) -> Result<Instance> {
        let record = self.registry.resolve(name)?;
        walk.chain.push(record.name.clone());
        trace!("Generating '{}' at chain depth {}", name, walk.chain.len());

        let mut instance = Instance::new(record.name.clone());
        for field in &record.fields {
            let value = match overrides.and_then(|o| o.get(&field.name)) {
                Some(value) => value.clone(),
                None => {
                    let site = Site {
                        record: &record.name,
                        field: Some(&field.name),
                    };
                    self.generate_type(&field.field_type, site, walk)?
                }
            };
            instance.fields.push((field.name.clone(), value));
        }

        walk.chain.pop();
        Ok(instance)
    }

    fn generate_type(&mut self, descriptor: &TypeDescriptor, site: Site<'_>, walk: &mut Walk) -> Result<Value> {
        walk.depth += 1;
        if walk.depth > self.config.max_nesting_depth {
            return Err(site.error(format!(
                "maximum nesting depth ({}) exceeded",
                self.config.max_nesting_depth
            )));
        }

        let value = match descriptor {
            TypeDescriptor::Primitive(kind) => self.primitive(*kind),
            TypeDescriptor::Logical(logical) => self.logical(*logical, site)?,
            TypeDescriptor::Fixed(fixed) => Value::Fixed(self.random_bytes(fixed.size)),
            TypeDescriptor::Enum(enum_type) => {
                let symbol = enum_type
                    .symbols
                    .choose(&mut self.rng)
                    .ok_or_else(|| site.error(format!("enum '{}' has no symbols", enum_type.name)))?;
                Value::Enum(symbol.clone())
            }
            TypeDescriptor::Array(items) => {
                let mut values = Vec::new();
                // Items that cannot terminate leave the collection empty
                if self.is_viable(items, walk)? {
                    let count = self.item_count();
                    for _ in 0..count {
                        values.push(self.generate_type(items, site, walk)?);
                    }
                }
                Value::Array(values)
            }
            TypeDescriptor::Map(values_type) => {
                let mut entries = BTreeMap::new();
                if self.is_viable(values_type, walk)? {
                    let count = self.item_count();
                    while entries.len() < count {
                        let key = self.random_string(MAP_KEY_LENGTH);
                        if entries.contains_key(&key) {
                            continue;
                        }
                        let value = self.generate_type(values_type, site, walk)?;
                        entries.insert(key, value);
                    }
                }
                Value::Map(entries)
            }
            TypeDescriptor::Union(_) | TypeDescriptor::Optional(_) => self.union(descriptor, site, walk)?,
            TypeDescriptor::RecordRef(name) => {
                if !self.is_viable(descriptor, walk)? {
                    return Err(site.error(format!(
                        "reference to '{}' exceeds the self-reference depth ({}) and has no terminal case",
                        name, self.config.max_self_reference_depth
                    )));
                }
                Value::Record(self.generate_record(name, None, walk)?)
            }
        };

        walk.depth -= 1;
        Ok(value)
    }

    fn union(&mut self, descriptor: &TypeDescriptor, site: Site<'_>, walk: &mut Walk) -> Result<Value> {
        let mut nullable = false;
        let mut viable: Vec<&TypeDescriptor> = Vec::new();
        for member in descriptor.members() {
            if member.is_null() {
                nullable = true;
            } else if self.is_viable(member, walk)? {
                viable.push(member);
            }
        }

        if viable.is_empty() {
            if nullable {
                return Ok(Value::Null);
            }
            return Err(site.error(format!(
                "no member of {} can be generated within the self-reference depth ({})",
                descriptor, self.config.max_self_reference_depth
            )));
        }

        // Explicit unions only fall back to null; optionals may draw it
        let optional = matches!(descriptor, TypeDescriptor::Optional(_));
        if optional && self.rng.gen_bool(self.config.optional_null_probability) {
            return Ok(Value::Null);
        }

        let member = viable
            .choose(&mut self.rng)
            .copied()
            .ok_or_else(|| site.error("union has no members"))?;
        self.generate_type(member, site, walk)
    }

    /// True if the descriptor can be produced without crossing the
    /// self-reference limit anywhere below it, given the current chain.
    ///
    /// Collections always can (they terminate empty); a record can if every
    /// field can with the record pushed on the chain.
    fn is_viable(&self, descriptor: &TypeDescriptor, walk: &mut Walk) -> Result<bool> {
        match descriptor {
            TypeDescriptor::RecordRef(name) => {
                if self.at_boundary(name, walk) {
                    return Ok(false);
                }
                let record = self.registry.resolve(name)?;
                walk.chain.push(record.name.clone());
                let mut viable = Ok(true);
                for field in &record.fields {
                    match self.is_viable(&field.field_type, walk) {
                        Ok(true) => {}
                        other => {
                            viable = other;
                            break;
                        }
                    }
                }
                walk.chain.pop();
                viable
            }
            TypeDescriptor::Union(_) | TypeDescriptor::Optional(_) => {
                for member in descriptor.members() {
                    if member.is_null() || self.is_viable(member, walk)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            _ => Ok(true),
        }
    }

    fn at_boundary(&self, name: &str, walk: &Walk) -> bool {
        walk.occurrences(name) >= self.config.max_self_reference_depth
    }

    fn primitive(&mut self, kind: PrimitiveKind) -> Value {
        match kind {
            PrimitiveKind::Boolean => Value::Boolean(self.rng.gen()),
            PrimitiveKind::Int32 => Value::Int(self.rng.gen()),
            PrimitiveKind::Int64 => Value::Long(self.rng.gen()),
            PrimitiveKind::Float32 => {
                // Half the type's max keeps the range width finite
                let bound = self.config.float_bound.min(f64::from(f32::MAX) / 2.0) as f32;
                Value::Float(self.rng.gen_range(-bound..bound))
            }
            PrimitiveKind::Float64 => {
                let bound = self.config.float_bound;
                Value::Double(self.rng.gen_range(-bound..bound))
            }
            PrimitiveKind::Bytes => {
                let len = self
                    .rng
                    .gen_range(self.config.min_bytes_length..=self.config.max_bytes_length);
                Value::Bytes(self.random_bytes(len))
            }
            PrimitiveKind::String => {
                let len = self
                    .rng
                    .gen_range(self.config.min_string_length..=self.config.max_string_length);
                Value::String(self.random_string(len))
            }
            PrimitiveKind::Null => Value::Null,
        }
    }

    fn logical(&mut self, logical: LogicalType, site: Site<'_>) -> Result<Value> {
        let value = match logical {
            LogicalType::Date => Value::Date(self.random_date(site)?),
            LogicalType::TimeMillis => Value::TimeMillis(self.random_time(1_000_000, site)?),
            LogicalType::TimeMicros => Value::TimeMicros(self.random_time(1_000, site)?),
            LogicalType::TimestampMillis => {
                let date = self.random_date(site)?;
                let time = self.random_time(1_000_000, site)?;
                Value::TimestampMillis(NaiveDateTime::new(date, time).and_utc())
            }
            LogicalType::TimestampMicros => {
                let date = self.random_date(site)?;
                let time = self.random_time(1_000, site)?;
                Value::TimestampMicros(NaiveDateTime::new(date, time).and_utc())
            }
            LogicalType::Uuid => {
                let mut bytes = [0u8; 16];
                self.rng.fill_bytes(&mut bytes);
                Value::Uuid(uuid::Builder::from_random_bytes(bytes).into_uuid())
            }
            LogicalType::Decimal { precision, scale } => {
                if scale > precision {
                    return Err(site.error(format!(
                        "decimal scale {} exceeds precision {}",
                        scale, precision
                    )));
                }
                // |unscaled| < 10^precision keeps the total digit count within precision
                let max = 10i128
                    .checked_pow(precision)
                    .map(|limit| limit - 1)
                    .ok_or_else(|| site.error(format!("decimal precision {} does not fit in 128 bits", precision)))?;
                let unscaled = self.rng.gen_range(-max..=max);
                Value::Decimal(Decimal::new(unscaled, scale))
            }
        };
        Ok(value)
    }

    fn random_date(&mut self, site: Site<'_>) -> Result<NaiveDate> {
        let start = NaiveDate::from_ymd_opt(self.config.start_year, 1, 1)
            .ok_or_else(|| site.error(format!("start_year {} is out of range", self.config.start_year)))?;
        let end = NaiveDate::from_ymd_opt(self.config.end_year, 12, 31)
            .ok_or_else(|| site.error(format!("end_year {} is out of range", self.config.end_year)))?;
        let span = end.signed_duration_since(start).num_days();
        let offset = self.rng.gen_range(0..=span);
        Ok(start + Duration::days(offset))
    }

    /// Random time of day truncated to `nanos_per_unit` (1_000_000 for millis, 1_000 for micros)
    fn random_time(&mut self, nanos_per_unit: u32, site: Site<'_>) -> Result<NaiveTime> {
        let seconds = self.rng.gen_range(0..86_400u32);
        let units = self.rng.gen_range(0..(1_000_000_000 / nanos_per_unit));
        NaiveTime::from_num_seconds_from_midnight_opt(seconds, units * nanos_per_unit)
            .ok_or_else(|| site.error("generated time of day is out of range"))
    }

    fn item_count(&mut self) -> usize {
        self.rng.gen_range(self.config.min_items..=self.config.max_items)
    }

    fn random_bytes(&mut self, len: usize) -> Bytes {
        let mut buf = vec![0u8; len];
        self.rng.fill_bytes(&mut buf);
        Bytes::from(buf)
    }

    fn random_string(&mut self, len: usize) -> String {
        (&mut self.rng)
            .sample_iter(&Alphanumeric)
            .take(len)
            .map(char::from)
            .collect()
    }
}
