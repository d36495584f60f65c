//! In-memory fruit store
//!
//! Records are JSON objects kept in insertion order. Ids come from a
//! monotonic counter and are never handed out twice, even after deletes.
//! Every lookup is by `id`; position is only used by [`FruitStore::get_at`].

use crate::{Error, Result};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Seed data loaded at startup
const SEED_FIXTURE: &str = include_str!("../fixtures/fruits.json");

/// Key holding the record id
const ID_KEY: &str = "id";

/// A fruit record
///
/// Carries `name` and `count` by convention; any other keys the client
/// sends are stored as given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fruit(Map<String, Value>);

impl Fruit {
    /// Build a record from client fields, attaching `id` as the last key
    pub fn new(mut fields: Map<String, Value>, id: u64) -> Self {
        fields.retain(|key, _| key != ID_KEY);
        fields.insert(ID_KEY.to_string(), Value::from(id));
        Self(fields)
    }

    pub fn id(&self) -> Option<u64> {
        self.0.get(ID_KEY).and_then(Value::as_u64)
    }

    pub fn name(&self) -> Option<&str> {
        self.0.get("name").and_then(Value::as_str)
    }

    pub fn count(&self) -> Option<i64> {
        self.0.get("count").and_then(Value::as_i64)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Shallow merge: patch keys overwrite, `id` is kept
    fn merge(&mut self, patch: Map<String, Value>) {
        for (key, value) in patch {
            if key != ID_KEY {
                self.0.insert(key, value);
            }
        }
    }
}

#[derive(Deserialize)]
struct Fixture {
    fruits: Vec<Fruit>,
}

#[derive(Debug)]
struct Inner {
    fruits: Vec<Fruit>,
    next_id: u64,
}

/// Shared, mutex-guarded fruit collection
#[derive(Debug)]
pub struct FruitStore {
    inner: Mutex<Inner>,
}

impl FruitStore {
    /// Create a store holding `fruits`; new ids start after the highest seed id
    pub fn new(fruits: Vec<Fruit>) -> Self {
        let next_id = fruits.iter().filter_map(Fruit::id).max().unwrap_or(0) + 1;
        Self {
            inner: Mutex::new(Inner { fruits, next_id }),
        }
    }

    /// Load the embedded seed fixture
    pub fn seeded() -> Result<Self> {
        Self::from_fixture(SEED_FIXTURE)
    }

    /// Load a fixture of the form `{"fruits": [...]}`
    ///
    /// Every record must carry a non-negative integer `id`.
    pub fn from_fixture(json: &str) -> Result<Self> {
        let fixture: Fixture = serde_json::from_str(json).map_err(Error::Fixture)?;
        if let Some(bad) = fixture.fruits.iter().find(|f| f.id().is_none()) {
            return Err(Error::InvalidBody(format!(
                "fixture record without integer id: {}",
                Value::Object(bad.fields().clone())
            )));
        }
        Ok(Self::new(fixture.fruits))
    }

    /// Append a record with a freshly assigned id
    pub fn create(&self, fields: Map<String, Value>) -> Fruit {
        let mut inner = self.inner.lock();
        let fruit = Fruit::new(fields, inner.next_id);
        inner.next_id += 1;
        inner.fruits.push(fruit.clone());
        fruit
    }

    /// Snapshot of all records in insertion order
    pub fn list(&self) -> Vec<Fruit> {
        self.inner.lock().fruits.clone()
    }

    pub fn get(&self, id: u64) -> Option<Fruit> {
        self.inner.lock().fruits.iter().find(|f| f.id() == Some(id)).cloned()
    }

    /// Record at a zero-based position
    pub fn get_at(&self, position: usize) -> Option<Fruit> {
        self.inner.lock().fruits.get(position).cloned()
    }

    /// Replace the record with `id` wholesale; `None` if absent
    pub fn replace(&self, id: u64, fields: Map<String, Value>) -> Option<Fruit> {
        let mut inner = self.inner.lock();
        let slot = inner.fruits.iter_mut().find(|f| f.id() == Some(id))?;
        *slot = Fruit::new(fields, id);
        Some(slot.clone())
    }

    /// Merge `patch` into the record with `id`; `None` if absent
    pub fn merge(&self, id: u64, patch: Map<String, Value>) -> Option<Fruit> {
        let mut inner = self.inner.lock();
        let slot = inner.fruits.iter_mut().find(|f| f.id() == Some(id))?;
        slot.merge(patch);
        Some(slot.clone())
    }

    /// Remove every record with `id` and return what is left
    pub fn remove(&self, id: u64) -> Vec<Fruit> {
        let mut inner = self.inner.lock();
        inner.fruits.retain(|f| f.id() != Some(id));
        inner.fruits.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().fruits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().fruits.is_empty()
    }
}
