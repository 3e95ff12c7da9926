//! Property list encoding, partial reserialization and reference rewriting.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::io::{Read, Write};

use graft_crypto::ContentHasher;
use graft_store::{LargeValueSink, LargeValues, RecordingLargeValues};
use graft_types::{ContentHash, Name, Property, Value};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use uuid::Uuid;

use crate::error::{CodecError, CodecResult};
use crate::references::ReferenceValues;
use crate::value::{
    read_wire_value, write_inline, write_large, write_reference, WireValue, TAG_REFERENCE,
    TAG_WEAK_REFERENCE,
};
use crate::wire::{read_string, read_u32, write_str, write_u32, CaptureReader};

/// Serializer behavior switches.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerializerOptions {
    /// Never write the `graft:uuid` property; the caller stores identity elsewhere.
    pub exclude_uuid_property: bool,
}

/// What a reserialization pass produced.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReserializeOutcome {
    /// Number of properties in the output stream.
    pub property_count: u32,
    /// Updated names that did not exist in the input stream.
    pub created: BTreeSet<Name>,
}

/// Encodes and decodes property lists.
///
/// A serialized list is a `u32` property count followed by each property:
/// its name, a `u32` value count, and the tagged values (see the `value`
/// module for the tag table). String, URI and binary values whose byte length
/// reaches [`LargeValues::minimum_size`] are written to the large value store
/// and replaced inline by a placeholder carrying their content hash.
#[derive(Clone, Debug, Default)]
pub struct Serializer {
    options: SerializerOptions,
}

impl Serializer {
    pub fn new(options: SerializerOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &SerializerOptions {
        &self.options
    }

    /// The content hash under which `bytes` are stored as a large value.
    pub fn compute_hash(bytes: &[u8]) -> ContentHash {
        ContentHasher::LARGE_VALUE.hash(bytes)
    }

    fn is_excluded(&self, property: &Property) -> bool {
        self.excludes(property.name())
    }

    fn excludes(&self, name: &Name) -> bool {
        self.options.exclude_uuid_property && name.as_str() == Property::UUID_PROPERTY
    }

    /// Write one property. Returns `false` if the property was excluded.
    pub fn serialize_property<W: Write + ?Sized>(
        &self,
        out: &mut W,
        property: &Property,
        large_values: &dyn LargeValues,
        references: &mut dyn ReferenceValues,
    ) -> CodecResult<bool> {
        if self.is_excluded(property) {
            trace!(name = %property.name(), "skipping excluded property");
            return Ok(false);
        }
        let count = u32::try_from(property.len()).map_err(|_| {
            CodecError::InvalidArgument(format!(
                "property {} has too many values ({})",
                property.name(),
                property.len()
            ))
        })?;
        write_str(out, property.name().as_str())?;
        write_u32(out, count)?;
        for value in property {
            self.serialize_value(out, value, large_values, references)?;
        }
        Ok(true)
    }

    fn serialize_value<W: Write + ?Sized>(
        &self,
        out: &mut W,
        value: &Value,
        large_values: &dyn LargeValues,
        references: &mut dyn ReferenceValues,
    ) -> CodecResult<()> {
        if let Some(bytes) = value.large_value_bytes() {
            let length = bytes.len() as u64;
            if length >= large_values.minimum_size() {
                let kind = value.property_type();
                let hash = Self::compute_hash(bytes);
                large_values.write(&hash, length, kind, value)?;
                debug!(hash = %hash.short_hex(), %kind, length, "externalized large value");
                return write_large(out, kind, &hash, length);
            }
        }
        if let Some(reference) = value.as_reference() {
            references.write(&reference);
        }
        write_inline(out, value)
    }

    /// Read one property, resolving large values from `large_values`.
    pub fn deserialize_property<R: Read + ?Sized>(
        &self,
        input: &mut R,
        large_values: &dyn LargeValues,
        references: &mut dyn ReferenceValues,
    ) -> CodecResult<Property> {
        let name = read_name(input)?;
        let count = read_u32(input)?;
        let mut values = Vec::with_capacity(count.min(64) as usize);
        for _ in 0..count {
            let wire = read_wire_value(input)?;
            values.push(resolve(wire, large_values, references)?);
        }
        Ok(Property::new(name, values))
    }

    /// Write a count-prefixed property list. Returns the number written.
    pub fn serialize_properties<'a, W: Write + ?Sized>(
        &self,
        out: &mut W,
        properties: impl IntoIterator<Item = &'a Property>,
        large_values: &dyn LargeValues,
        references: &mut dyn ReferenceValues,
    ) -> CodecResult<u32> {
        let included: Vec<&Property> = properties
            .into_iter()
            .filter(|property| !self.is_excluded(property))
            .collect();
        let count = u32::try_from(included.len()).map_err(|_| {
            CodecError::InvalidArgument(format!("too many properties ({})", included.len()))
        })?;
        write_u32(out, count)?;
        for property in included {
            self.serialize_property(out, property, large_values, references)?;
        }
        trace!(count, "serialized properties");
        Ok(count)
    }

    /// Read a whole count-prefixed property list.
    pub fn deserialize_all_properties<R: Read + ?Sized>(
        &self,
        input: &mut R,
        large_values: &dyn LargeValues,
        references: &mut dyn ReferenceValues,
    ) -> CodecResult<Vec<Property>> {
        let count = read_u32(input)?;
        let mut properties = Vec::with_capacity(count.min(64) as usize);
        for _ in 0..count {
            properties.push(self.deserialize_property(input, large_values, references)?);
        }
        Ok(properties)
    }

    /// Read only the properties named in `names`.
    ///
    /// Other properties are decoded but discarded; their large values are not
    /// read from the store but reported to `skipped` instead.
    pub fn deserialize_some_properties<R: Read + ?Sized>(
        &self,
        input: &mut R,
        names: &BTreeSet<Name>,
        large_values: &dyn LargeValues,
        skipped: &mut dyn LargeValueSink,
        references: &mut dyn ReferenceValues,
    ) -> CodecResult<Vec<Property>> {
        if names.is_empty() {
            return Err(CodecError::InvalidArgument(
                "at least one property name is required".into(),
            ));
        }
        let count = read_u32(input)?;
        let mut properties = Vec::new();
        for _ in 0..count {
            let name = read_name(input)?;
            let value_count = read_u32(input)?;
            if names.contains(&name) {
                let mut values = Vec::with_capacity(value_count.min(64) as usize);
                for _ in 0..value_count {
                    let wire = read_wire_value(input)?;
                    values.push(resolve(wire, large_values, references)?);
                }
                properties.push(Property::new(name, values));
            } else {
                for _ in 0..value_count {
                    if let WireValue::Large { hash, length, .. } = read_wire_value(input)? {
                        skipped.record(&hash, length);
                    }
                }
            }
        }
        Ok(properties)
    }

    /// Apply `updates` to a serialized property list in one forward pass.
    ///
    /// Properties not named in `updates` are copied byte for byte. Named ones
    /// are dropped and, when the update carries a property, re-added at the
    /// end; `None` deletes. Large values that only the dropped properties
    /// referred to are reported to `removed`.
    ///
    /// Every updated name missing from the input is reported in `created`,
    /// deletions included. Updates for an excluded property are ignored: an
    /// existing one is copied through and the name is never reported.
    pub fn reserialize_properties<R: Read + ?Sized, W: Write + ?Sized>(
        &self,
        input: &mut R,
        output: &mut W,
        updates: &BTreeMap<Name, Option<Property>>,
        large_values: &dyn LargeValues,
        removed: &mut dyn LargeValueSink,
        references: &mut dyn ReferenceValues,
    ) -> CodecResult<ReserializeOutcome> {
        for (name, update) in updates {
            if let Some(property) = update {
                if property.name() != name {
                    return Err(CodecError::InvalidArgument(format!(
                        "update for {name} carries property {}",
                        property.name()
                    )));
                }
            }
        }

        let count = read_u32(input)?;
        // The output count is only known at the end, so the body is buffered.
        let mut body = Vec::new();
        let mut kept: u32 = 0;
        let mut seen = BTreeSet::new();
        let mut retained = BTreeSet::new();
        let mut dropped = BTreeMap::new();

        for _ in 0..count {
            let mut capture = CaptureReader::new(&mut *input);
            let name = read_name(&mut capture)?;
            let value_count = read_u32(&mut capture)?;
            let replaced = updates.contains_key(&name) && !self.excludes(&name);
            for _ in 0..value_count {
                match read_wire_value(&mut capture)? {
                    WireValue::Large { hash, length, .. } => {
                        if replaced {
                            dropped.insert(hash, length);
                        } else {
                            retained.insert(hash);
                        }
                    }
                    WireValue::Inline(value) => {
                        if replaced {
                            if let Some(reference) = value.as_reference() {
                                references.remove(&reference);
                            }
                        }
                    }
                }
            }
            if !replaced {
                body.extend_from_slice(capture.captured());
                kept += 1;
            }
            seen.insert(name);
        }

        let recording = RecordingLargeValues::new(large_values);
        let mut added: u32 = 0;
        for property in updates.values().flatten() {
            if self.serialize_property(&mut body, property, &recording, references)? {
                added += 1;
            }
        }
        retained.extend(recording.written_hashes());

        let mut removed_count = 0usize;
        for (hash, length) in &dropped {
            if !retained.contains(hash) {
                removed.record(hash, *length);
                removed_count += 1;
            }
        }

        let created: BTreeSet<Name> = updates
            .keys()
            .filter(|name| !seen.contains(*name) && !self.excludes(name))
            .cloned()
            .collect();

        let property_count = kept + added;
        write_u32(output, property_count)?;
        output.write_all(&body)?;

        debug!(
            read = count,
            kept,
            added,
            created = created.len(),
            removed_large_values = removed_count,
            "reserialized properties"
        );
        Ok(ReserializeOutcome {
            property_count,
            created,
        })
    }

    /// Copy a serialized property list, retargeting references.
    ///
    /// Every strong or weak reference whose target is a key of `mapping` is
    /// rewritten to the mapped uuid; everything else is copied unchanged.
    /// Returns the number of references rewritten.
    pub fn adjust_reference_properties<R: Read + ?Sized, W: Write + ?Sized>(
        &self,
        input: &mut R,
        output: &mut W,
        mapping: &HashMap<Uuid, Uuid>,
    ) -> CodecResult<usize> {
        let count = read_u32(input)?;
        write_u32(output, count)?;
        let mut rewritten = 0;
        for _ in 0..count {
            let mut capture = CaptureReader::new(&mut *input);
            read_name(&mut capture)?;
            let value_count = read_u32(&mut capture)?;
            output.write_all(capture.captured())?;
            for _ in 0..value_count {
                capture.reset();
                let retarget = match read_wire_value(&mut capture)? {
                    WireValue::Inline(Value::Reference(target)) => mapping
                        .get(&target)
                        .map(|new_target| (TAG_REFERENCE, new_target)),
                    WireValue::Inline(Value::WeakReference(target)) => mapping
                        .get(&target)
                        .map(|new_target| (TAG_WEAK_REFERENCE, new_target)),
                    _ => None,
                };
                match retarget {
                    Some((tag, new_target)) => {
                        write_reference(output, tag, new_target)?;
                        rewritten += 1;
                    }
                    None => output.write_all(capture.captured())?,
                }
            }
        }
        debug!(properties = count, rewritten, "adjusted reference properties");
        Ok(rewritten)
    }
}

fn read_name<R: Read + ?Sized>(input: &mut R) -> CodecResult<Name> {
    Ok(Name::new(read_string(input)?)?)
}

fn resolve(
    wire: WireValue,
    large_values: &dyn LargeValues,
    references: &mut dyn ReferenceValues,
) -> CodecResult<Value> {
    match wire {
        WireValue::Inline(value) => {
            if let Some(reference) = value.as_reference() {
                references.read(&reference);
            }
            Ok(value)
        }
        WireValue::Large { kind, hash, length } => {
            let stored = large_values
                .read(&hash, length)?
                .ok_or(CodecError::DanglingLargeValue { hash, length })?;
            if stored.property_type() == kind {
                return Ok(stored);
            }
            // Equal bytes of another kind share one stored record; the placeholder decides.
            let bytes = stored
                .large_value_bytes()
                .map(<[u8]>::to_vec)
                .ok_or_else(|| {
                    CodecError::InvalidValue(format!(
                        "large value {hash} holds a {} value",
                        stored.property_type()
                    ))
                })?;
            Ok(Value::from_large_value_bytes(kind, bytes)?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::references::{NoReferenceValues, References};
    use graft_store::{InMemoryLargeValueStore, NoLargeValues, SkippedLargeValues, StoreResult};
    use graft_types::{Decimal, Path, PropertyType, Reference};
    use proptest::prelude::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn name(s: &str) -> Name {
        Name::new(s).unwrap()
    }

    fn prop(s: &str, values: Vec<Value>) -> Property {
        Property::new(name(s), values)
    }

    fn large(tag: &str) -> Value {
        Value::String(format!("{tag}: {}", "large value content ".repeat(4)))
    }

    fn hash_of(value: &Value) -> ContentHash {
        Serializer::compute_hash(value.large_value_bytes().unwrap())
    }

    fn encode(properties: &[Property], store: &dyn LargeValues) -> Vec<u8> {
        let mut out = Vec::new();
        Serializer::default()
            .serialize_properties(&mut out, properties, store, &mut NoReferenceValues)
            .unwrap();
        out
    }

    fn decode(bytes: &[u8], store: &dyn LargeValues) -> Vec<Property> {
        Serializer::default()
            .deserialize_all_properties(&mut &bytes[..], store, &mut NoReferenceValues)
            .unwrap()
    }

    fn names_of(properties: &[Property]) -> BTreeSet<String> {
        properties
            .iter()
            .map(|p| p.name().as_str().to_string())
            .collect()
    }

    /// Counts writes so the threshold law can assert exactly one.
    struct CountingStore {
        inner: InMemoryLargeValueStore,
        writes: AtomicUsize,
    }

    impl LargeValues for CountingStore {
        fn minimum_size(&self) -> u64 {
            self.inner.minimum_size()
        }

        fn read(&self, hash: &ContentHash, length: u64) -> StoreResult<Option<Value>> {
            self.inner.read(hash, length)
        }

        fn write(
            &self,
            hash: &ContentHash,
            length: u64,
            kind: PropertyType,
            value: &Value,
        ) -> StoreResult<()> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.inner.write(hash, length, kind, value)
        }
    }

    #[test]
    fn every_kind_round_trips_inline_and_large() {
        let store = InMemoryLargeValueStore::with_minimum_size(32);
        let properties = vec![
            prop("small-string", vec![Value::from("short")]),
            prop("big-string", vec![large("s")]),
            prop("small-binary", vec![Value::Binary(vec![1, 2, 3])]),
            prop("big-binary", vec![Value::Binary(vec![7; 500])]),
            prop("small-uri", vec![Value::Uri("urn:x".into())]),
            prop(
                "big-uri",
                vec![Value::Uri(format!("https://example.org/{}", "seg/".repeat(20)))],
            ),
            prop(
                "mixed",
                vec![
                    Value::Long(-9),
                    Value::Double(2.5),
                    Value::Boolean(false),
                    Value::Decimal(Decimal::new("-0.001").unwrap()),
                    Value::Name(name("nt:unstructured")),
                    Value::Path(Path::parse("/a/b[3]/c").unwrap()),
                    Value::Uuid(Uuid::from_u128(11)),
                    Value::Reference(Uuid::from_u128(12)),
                    Value::WeakReference(Uuid::from_u128(13)),
                    Value::Object(serde_json::json!({"nested": {"ok": true}})),
                ],
            ),
            prop("empty", vec![]),
        ];
        let bytes = encode(&properties, &store);
        assert_eq!(store.len(), 3);
        assert_eq!(decode(&bytes, &store), properties);
    }

    #[test]
    fn threshold_is_inclusive() {
        let store = CountingStore {
            inner: InMemoryLargeValueStore::with_minimum_size(10),
            writes: AtomicUsize::new(0),
        };
        let serializer = Serializer::default();

        let mut below = Vec::new();
        serializer
            .serialize_property(
                &mut below,
                &prop("p", vec![Value::from("123456789")]),
                &store,
                &mut NoReferenceValues,
            )
            .unwrap();
        assert_eq!(store.writes.load(Ordering::SeqCst), 0);
        assert!(store.inner.is_empty());

        let at = Value::from("1234567890");
        let mut out = Vec::new();
        serializer
            .serialize_property(&mut out, &prop("p", vec![at.clone()]), &store, &mut NoReferenceValues)
            .unwrap();
        assert_eq!(store.writes.load(Ordering::SeqCst), 1);
        assert_eq!(store.inner.hashes(), vec![hash_of(&at)]);

        let back = serializer
            .deserialize_property(&mut out.as_slice(), &store, &mut NoReferenceValues)
            .unwrap();
        assert_eq!(back.values(), &[at]);
    }

    #[test]
    fn placeholder_is_smaller_than_value() {
        let store = InMemoryLargeValueStore::with_minimum_size(64);
        let value = Value::Binary(vec![3; 10_000]);
        let bytes = encode(&[prop("data", vec![value])], &store);
        assert!(bytes.len() < 100);
    }

    #[test]
    fn identical_large_values_are_stored_once() {
        let store = InMemoryLargeValueStore::with_minimum_size(16);
        let shared = large("shared");
        let bytes = encode(
            &[
                prop("a", vec![shared.clone()]),
                prop("b", vec![shared.clone(), shared.clone()]),
            ],
            &store,
        );
        assert_eq!(store.len(), 1);
        assert_eq!(decode(&bytes, &store)[1].values(), &[shared.clone(), shared]);
    }

    #[test]
    fn no_large_values_keeps_everything_inline() {
        let value = Value::Binary(vec![1; 4096]);
        let bytes = encode(&[prop("p", vec![value.clone()])], &NoLargeValues);
        assert_eq!(decode(&bytes, &NoLargeValues)[0].values(), &[value]);
    }

    #[test]
    fn references_are_reported() {
        let store = InMemoryLargeValueStore::new();
        let strong = Uuid::from_u128(1);
        let weak = Uuid::from_u128(2);
        let properties = [prop(
            "refs",
            vec![Value::Reference(strong), Value::WeakReference(weak), Value::Long(3)],
        )];
        let serializer = Serializer::default();

        let mut refs = References::new();
        let mut out = Vec::new();
        serializer
            .serialize_properties(&mut out, &properties, &store, &mut refs)
            .unwrap();
        let expected = BTreeSet::from([Reference::strong(strong), Reference::weak(weak)]);
        assert_eq!(refs.written_references(), &expected);
        assert!(refs.read_references().is_empty());

        let mut read_refs = References::new();
        serializer
            .deserialize_all_properties(&mut out.as_slice(), &store, &mut read_refs)
            .unwrap();
        assert_eq!(read_refs.read_references(), &expected);
    }

    #[test]
    fn uuid_property_can_be_excluded() {
        let store = InMemoryLargeValueStore::new();
        let serializer = Serializer::new(SerializerOptions {
            exclude_uuid_property: true,
        });
        let identity = prop(Property::UUID_PROPERTY, vec![Value::Uuid(Uuid::from_u128(5))]);
        let other = prop("title", vec![Value::from("hello")]);

        let mut single = Vec::new();
        let written = serializer
            .serialize_property(&mut single, &identity, &store, &mut NoReferenceValues)
            .unwrap();
        assert!(!written);
        assert!(single.is_empty());

        let mut out = Vec::new();
        let count = serializer
            .serialize_properties(&mut out, [&identity, &other], &store, &mut NoReferenceValues)
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(decode(&out, &store), vec![other.clone()]);

        // Included by default.
        assert_eq!(decode(&encode(&[identity, other], &store), &store).len(), 2);
    }

    #[test]
    fn missing_large_value_is_dangling() {
        let store = InMemoryLargeValueStore::with_minimum_size(16);
        let value = large("gone");
        let bytes = encode(&[prop("p", vec![value.clone()])], &store);
        let empty = InMemoryLargeValueStore::with_minimum_size(16);
        let err = Serializer::default()
            .deserialize_all_properties(&mut bytes.as_slice(), &empty, &mut NoReferenceValues)
            .unwrap_err();
        match err {
            CodecError::DanglingLargeValue { hash, length } => {
                assert_eq!(hash, hash_of(&value));
                assert_eq!(length, value.large_value_bytes().unwrap().len() as u64);
            }
            other => panic!("expected dangling large value, got {other:?}"),
        }
    }

    #[test]
    fn every_truncation_is_an_error() {
        let store = InMemoryLargeValueStore::with_minimum_size(16);
        let bytes = encode(
            &[
                prop("a", vec![Value::from("x"), Value::Long(1)]),
                prop("b", vec![large("b"), Value::Reference(Uuid::from_u128(9))]),
            ],
            &store,
        );
        for cut in 0..bytes.len() {
            let result = Serializer::default().deserialize_all_properties(
                &mut &bytes[..cut],
                &store,
                &mut NoReferenceValues,
            );
            assert!(
                matches!(result, Err(CodecError::Truncated)),
                "prefix of {cut} bytes gave {result:?}"
            );
        }
    }

    #[test]
    fn unknown_tag_is_a_decode_error() {
        let mut bytes = Vec::new();
        write_u32(&mut bytes, 1).unwrap();
        write_str(&mut bytes, "p").unwrap();
        write_u32(&mut bytes, 1).unwrap();
        bytes.push(b'?');
        let err = Serializer::default()
            .deserialize_all_properties(&mut bytes.as_slice(), &NoLargeValues, &mut NoReferenceValues)
            .unwrap_err();
        assert!(matches!(err, CodecError::UnknownTag(b'?')));
    }

    #[test]
    fn deserialize_some_reads_only_named_properties() {
        let store = InMemoryLargeValueStore::with_minimum_size(16);
        let wanted = prop("wanted", vec![large("wanted"), Value::Long(1)]);
        let other = prop("other", vec![large("other")]);
        let bytes = encode(&[other.clone(), wanted.clone()], &store);

        let mut skipped = SkippedLargeValues::new();
        let recording = RecordingLargeValues::new(&store);
        let found = Serializer::default()
            .deserialize_some_properties(
                &mut bytes.as_slice(),
                &BTreeSet::from([name("wanted"), name("absent")]),
                &recording,
                &mut skipped,
                &mut NoReferenceValues,
            )
            .unwrap();
        assert_eq!(found, vec![wanted.clone()]);
        assert_eq!(
            skipped.into_hashes(),
            BTreeSet::from([hash_of(&other.values()[0])])
        );
        assert_eq!(
            recording.read_hashes(),
            BTreeSet::from([hash_of(&wanted.values()[0])])
        );
    }

    #[test]
    fn deserialize_some_requires_names() {
        let bytes = encode(&[prop("p", vec![])], &NoLargeValues);
        let err = Serializer::default()
            .deserialize_some_properties(
                &mut bytes.as_slice(),
                &BTreeSet::new(),
                &NoLargeValues,
                &mut SkippedLargeValues::new(),
                &mut NoReferenceValues,
            )
            .unwrap_err();
        assert!(matches!(err, CodecError::InvalidArgument(_)));
    }

    #[test]
    fn reserialize_accounting() {
        let store = InMemoryLargeValueStore::with_minimum_size(16);
        let shared = large("shared");
        let only_p2 = large("p2");
        let only_p3 = large("p3");
        let old_ref = Uuid::from_u128(300);
        let original: Vec<Property> = (1..=8)
            .map(|i| {
                let key = format!("p{i}");
                match i {
                    2 => prop(&key, vec![only_p2.clone(), shared.clone()]),
                    3 => prop(&key, vec![only_p3.clone(), Value::Reference(old_ref)]),
                    5 => prop(&key, vec![shared.clone()]),
                    _ => prop(&key, vec![Value::Long(i)]),
                }
            })
            .collect();
        let input = encode(&original, &store);
        assert_eq!(store.len(), 3);

        let new_p3 = prop("p3", vec![large("new p3"), Value::from("small")]);
        let new_p9 = prop("p9", vec![Value::Boolean(true)]);
        let updates = BTreeMap::from([
            (name("p2"), None),
            (name("p3"), Some(new_p3.clone())),
            (name("p9"), Some(new_p9.clone())),
        ]);

        let mut output = Vec::new();
        let mut removed = SkippedLargeValues::new();
        let mut refs = References::new();
        let outcome = Serializer::default()
            .reserialize_properties(
                &mut input.as_slice(),
                &mut output,
                &updates,
                &store,
                &mut removed,
                &mut refs,
            )
            .unwrap();

        assert_eq!(outcome.property_count, 8);
        assert_eq!(outcome.created, BTreeSet::from([name("p9")]));
        assert_eq!(
            removed.into_hashes(),
            BTreeSet::from([hash_of(&only_p2), hash_of(&only_p3)])
        );
        assert_eq!(
            refs.removed_references(),
            &BTreeSet::from([Reference::strong(old_ref)])
        );

        let result = decode(&output, &store);
        let expected_names: BTreeSet<String> = ["p1", "p3", "p4", "p5", "p6", "p7", "p8", "p9"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(names_of(&result), expected_names);
        assert!(result.contains(&new_p3));
        assert!(result.contains(&new_p9));
        assert!(result.contains(&original[4]));
    }

    #[test]
    fn rewritten_value_keeps_its_large_value() {
        let store = InMemoryLargeValueStore::with_minimum_size(16);
        let value = large("kept");
        let input = encode(&[prop("p", vec![value.clone()])], &store);
        let updates = BTreeMap::from([(
            name("p"),
            Some(prop("p", vec![value.clone(), Value::Long(2)])),
        )]);
        let mut removed = SkippedLargeValues::new();
        let outcome = Serializer::default()
            .reserialize_properties(
                &mut input.as_slice(),
                &mut Vec::new(),
                &updates,
                &store,
                &mut removed,
                &mut NoReferenceValues,
            )
            .unwrap();
        assert!(removed.is_empty());
        assert!(outcome.created.is_empty());
        assert_eq!(outcome.property_count, 1);
    }

    #[test]
    fn deleting_an_unknown_name_is_reported_as_created() {
        let input = encode(&[prop("p", vec![Value::Long(1)])], &NoLargeValues);
        let updates = BTreeMap::from([(name("ghost"), None)]);
        let mut output = Vec::new();
        let outcome = Serializer::default()
            .reserialize_properties(
                &mut input.as_slice(),
                &mut output,
                &updates,
                &NoLargeValues,
                &mut SkippedLargeValues::new(),
                &mut NoReferenceValues,
            )
            .unwrap();
        assert_eq!(outcome.created, BTreeSet::from([name("ghost")]));
        assert_eq!(outcome.property_count, 1);
        assert_eq!(output, input);
    }

    #[test]
    fn excluded_uuid_property_survives_reserialization() {
        let identity = prop(Property::UUID_PROPERTY, vec![large("identity")]);
        let store = InMemoryLargeValueStore::with_minimum_size(16);
        let input = encode(&[identity.clone(), prop("p", vec![Value::Long(1)])], &store);
        let serializer = Serializer::new(SerializerOptions {
            exclude_uuid_property: true,
        });

        let updates = BTreeMap::from([
            (name(Property::UUID_PROPERTY), None),
            (name("p"), Some(prop("p", vec![Value::Long(2)]))),
        ]);
        let mut output = Vec::new();
        let mut removed = SkippedLargeValues::new();
        let outcome = serializer
            .reserialize_properties(
                &mut input.as_slice(),
                &mut output,
                &updates,
                &store,
                &mut removed,
                &mut NoReferenceValues,
            )
            .unwrap();

        assert!(removed.is_empty());
        assert!(outcome.created.is_empty());
        assert_eq!(outcome.property_count, 2);
        let result = decode(&output, &store);
        assert!(result.contains(&identity));
        assert!(result.contains(&prop("p", vec![Value::Long(2)])));
    }

    #[test]
    fn excluded_uuid_update_is_not_created() {
        let input = encode(&[prop("p", vec![Value::Long(1)])], &NoLargeValues);
        let serializer = Serializer::new(SerializerOptions {
            exclude_uuid_property: true,
        });
        let updates = BTreeMap::from([(
            name(Property::UUID_PROPERTY),
            Some(prop(Property::UUID_PROPERTY, vec![Value::from("fresh")])),
        )]);
        let mut output = Vec::new();
        let outcome = serializer
            .reserialize_properties(
                &mut input.as_slice(),
                &mut output,
                &updates,
                &NoLargeValues,
                &mut SkippedLargeValues::new(),
                &mut NoReferenceValues,
            )
            .unwrap();
        assert!(outcome.created.is_empty());
        assert_eq!(outcome.property_count, 1);
        assert_eq!(output, input);
    }

    #[test]
    fn same_bytes_of_different_kinds_round_trip() {
        let text = "shared content across kinds ".repeat(3);
        let store = InMemoryLargeValueStore::with_minimum_size(16);
        let properties = vec![
            prop("s", vec![Value::String(text.clone())]),
            prop("u", vec![Value::Uri(text.clone())]),
            prop("b", vec![Value::Binary(text.clone().into_bytes())]),
        ];
        let bytes = encode(&properties, &store);
        assert_eq!(store.len(), 1);
        assert_eq!(decode(&bytes, &store), properties);
    }

    #[test]
    fn mismatched_update_name_is_rejected_before_writing() {
        let input = encode(&[prop("p", vec![Value::Long(1)])], &NoLargeValues);
        let updates = BTreeMap::from([(name("p"), Some(prop("q", vec![])))]);
        let mut output = Vec::new();
        let err = Serializer::default()
            .reserialize_properties(
                &mut input.as_slice(),
                &mut output,
                &updates,
                &NoLargeValues,
                &mut SkippedLargeValues::new(),
                &mut NoReferenceValues,
            )
            .unwrap_err();
        assert!(matches!(err, CodecError::InvalidArgument(_)));
        assert!(output.is_empty());
    }

    #[test]
    fn adjust_references_rewrites_only_mapped_targets() {
        let u7 = Uuid::from_u128(7);
        let u7_new = Uuid::from_u128(70);
        let u8 = Uuid::from_u128(8);
        let original = vec![
            prop(
                "refs",
                vec![Value::Reference(u7), Value::Reference(u8), Value::WeakReference(u7)],
            ),
            prop("plain", vec![Value::Uuid(u7), Value::from("text")]),
        ];
        let input = encode(&original, &NoLargeValues);

        let mut output = Vec::new();
        let rewritten = Serializer::default()
            .adjust_reference_properties(
                &mut input.as_slice(),
                &mut output,
                &HashMap::from([(u7, u7_new)]),
            )
            .unwrap();
        assert_eq!(rewritten, 2);
        assert_eq!(output.len(), input.len());

        let result = decode(&output, &NoLargeValues);
        assert_eq!(
            result[0].values(),
            &[
                Value::Reference(u7_new),
                Value::Reference(u8),
                Value::WeakReference(u7_new)
            ]
        );
        // Plain uuids are not references.
        assert_eq!(result[1], original[1]);
    }

    #[test]
    fn adjust_references_leaves_large_placeholders_alone() {
        let store = InMemoryLargeValueStore::with_minimum_size(16);
        let input = encode(&[prop("p", vec![large("x")])], &store);
        let mut output = Vec::new();
        let rewritten = Serializer::default()
            .adjust_reference_properties(&mut input.as_slice(), &mut output, &HashMap::new())
            .unwrap();
        assert_eq!(rewritten, 0);
        assert_eq!(output, input);
    }

    fn value_strategy() -> impl Strategy<Value = Value> {
        prop_oneof![
            ".{0,48}".prop_map(Value::String),
            prop::collection::vec(any::<u8>(), 0..96).prop_map(Value::Binary),
            any::<i64>().prop_map(Value::Long),
            (-1.0e9..1.0e9f64).prop_map(Value::Double),
            any::<bool>().prop_map(Value::Boolean),
            any::<u128>().prop_map(|n| Value::Reference(Uuid::from_u128(n))),
            "[a-z]{1,12}".prop_map(|s| Value::Uri(format!("urn:{s}"))),
        ]
    }

    fn properties_strategy() -> impl Strategy<Value = Vec<Property>> {
        prop::collection::vec(prop::collection::vec(value_strategy(), 0..4), 0..8).prop_map(
            |lists| {
                lists
                    .into_iter()
                    .enumerate()
                    .map(|(i, values)| prop(&format!("p{i}"), values))
                    .collect()
            },
        )
    }

    proptest! {
        #[test]
        fn round_trip_law(properties in properties_strategy(), minimum in 1u64..64) {
            let store = InMemoryLargeValueStore::with_minimum_size(minimum);
            let bytes = encode(&properties, &store);
            prop_assert_eq!(decode(&bytes, &store), properties);
        }

        #[test]
        fn empty_update_is_byte_identical(properties in properties_strategy()) {
            let store = InMemoryLargeValueStore::with_minimum_size(24);
            let input = encode(&properties, &store);
            let mut output = Vec::new();
            let mut removed = SkippedLargeValues::new();
            let outcome = Serializer::default()
                .reserialize_properties(
                    &mut input.as_slice(),
                    &mut output,
                    &BTreeMap::new(),
                    &store,
                    &mut removed,
                    &mut NoReferenceValues,
                )
                .unwrap();
            prop_assert_eq!(output, input);
            prop_assert!(removed.is_empty());
            prop_assert_eq!(outcome.property_count as usize, properties.len());
        }
    }
}
