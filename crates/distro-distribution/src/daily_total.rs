//! Daily total ledger
//!
//! Cumulative amount released per calendar date, stored as decimal ASCII
//! under `distributed/<YYYY-MM-DD>`. An absent key means nothing has been
//! released that day. Totals only ever grow.

use distro_core::{Amount, DistributionDate};
use distro_storage::{KvStore, PrefixStore, Result, StorageError, WriteBatch};

use crate::keys::{daily_total_key, DAILY_TOTAL_PREFIX};

/// Encode a total for storage
pub fn encode_total(amount: Amount) -> Vec<u8> {
    amount.to_string().into_bytes()
}

/// Decode a stored total
pub fn decode_total(key: &[u8], value: &[u8]) -> Result<Amount> {
    std::str::from_utf8(value)
        .ok()
        .and_then(|s| s.parse::<Amount>().ok())
        .ok_or_else(|| StorageError::Corrupted {
            key: String::from_utf8_lossy(key).into_owned(),
            reason: "daily total is not a decimal u64".to_string(),
        })
}

/// Decode a stored date key
pub fn decode_date(key: &[u8]) -> Result<DistributionDate> {
    std::str::from_utf8(key)
        .ok()
        .and_then(|s| DistributionDate::parse(s).ok())
        .ok_or_else(|| StorageError::Corrupted {
            key: String::from_utf8_lossy(key).into_owned(),
            reason: "daily total key is not a canonical date".to_string(),
        })
}

/// Per-date cumulative totals backed by the store
pub struct DailyTotalLedger<'a, S: KvStore + ?Sized> {
    view: PrefixStore<'a, S>,
}

impl<'a, S: KvStore + ?Sized> DailyTotalLedger<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            view: PrefixStore::new(store, DAILY_TOTAL_PREFIX),
        }
    }

    /// Total released on `date`, `None` if nothing has been
    pub fn get(&self, date: &DistributionDate) -> Result<Option<Amount>> {
        let key = daily_total_key(date);
        self.view
            .get(&key)?
            .map(|value| decode_total(&key, &value))
            .transpose()
    }

    pub fn set(&self, date: &DistributionDate, amount: Amount) -> Result<()> {
        self.view.set(&daily_total_key(date), &encode_total(amount))
    }

    /// Add `delta` to the total of `date` and persist it
    pub fn accumulate(&self, date: &DistributionDate, delta: Amount) -> Result<Amount> {
        let updated = self.checked_total(date, delta)?;
        self.set(date, updated)?;
        Ok(updated)
    }

    /// Stage a write of `amount` for `date` into `batch`
    pub fn stage_set(&self, batch: &mut WriteBatch, date: &DistributionDate, amount: Amount) {
        self.view
            .stage_set(batch, &daily_total_key(date), &encode_total(amount));
    }

    /// Every recorded total, ascending by date
    pub fn entries(&self) -> Result<Vec<(DistributionDate, Amount)>> {
        self.view
            .scan()?
            .into_iter()
            .map(|(key, value)| Ok((decode_date(&key)?, decode_total(&key, &value)?)))
            .collect()
    }

    /// Raw namespace scan, for pagination
    pub fn scan(&self) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        self.view.scan()
    }

    fn checked_total(&self, date: &DistributionDate, delta: Amount) -> Result<Amount> {
        let already = self.get(date)?.unwrap_or(0);
        already.checked_add(delta).ok_or_else(|| StorageError::Corrupted {
            key: date.to_string(),
            reason: format!("total {} + {} overflows u64", already, delta),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use distro_storage::MemoryStore;

    fn date(s: &str) -> DistributionDate {
        DistributionDate::parse(s).unwrap()
    }

    #[test]
    fn test_absent_is_none() {
        let store = MemoryStore::new();
        let ledger = DailyTotalLedger::new(&store);
        assert_eq!(ledger.get(&date("2025-03-01")).unwrap(), None);
    }

    #[test]
    fn test_accumulate() {
        let store = MemoryStore::new();
        let ledger = DailyTotalLedger::new(&store);
        let day = date("2025-03-01");

        assert_eq!(ledger.accumulate(&day, 300).unwrap(), 300);
        assert_eq!(ledger.accumulate(&day, 200).unwrap(), 500);
        assert_eq!(ledger.get(&day).unwrap(), Some(500));
        assert_eq!(store.get(b"distributed/2025-03-01").unwrap(), Some(b"500".to_vec()));
    }

    #[test]
    fn test_accumulate_overflow() {
        let store = MemoryStore::new();
        let ledger = DailyTotalLedger::new(&store);
        let day = date("2025-03-01");
        ledger.set(&day, u64::MAX).unwrap();

        assert!(ledger.accumulate(&day, 1).is_err());
        assert_eq!(ledger.get(&day).unwrap(), Some(u64::MAX));
    }

    #[test]
    fn test_stage_set_defers_write() {
        let store = MemoryStore::new();
        let ledger = DailyTotalLedger::new(&store);
        let day = date("2025-03-01");
        ledger.set(&day, 100).unwrap();

        let mut batch = WriteBatch::new();
        ledger.stage_set(&mut batch, &day, 150);
        assert_eq!(ledger.get(&day).unwrap(), Some(100));

        store.apply(batch).unwrap();
        assert_eq!(ledger.get(&day).unwrap(), Some(150));
    }

    #[test]
    fn test_corrupted_value() {
        let store = MemoryStore::new();
        store.set(b"distributed/2025-03-01", &[0, 0, 0, 0, 0, 0, 1, 0]).unwrap();
        let ledger = DailyTotalLedger::new(&store);

        assert!(matches!(
            ledger.get(&date("2025-03-01")),
            Err(StorageError::Corrupted { .. })
        ));
    }

    #[test]
    fn test_entries_in_date_order() {
        let store = MemoryStore::new();
        let ledger = DailyTotalLedger::new(&store);
        ledger.set(&date("2025-03-02"), 2).unwrap();
        ledger.set(&date("2024-12-31"), 1).unwrap();
        ledger.set(&date("2025-03-01"), 3).unwrap();

        let entries = ledger.entries().unwrap();
        let dates: Vec<_> = entries.iter().map(|(d, _)| d.to_string()).collect();
        assert_eq!(dates, vec!["2024-12-31", "2025-03-01", "2025-03-02"]);
    }
}
