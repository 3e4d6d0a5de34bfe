//! Open-addressing symbol table with linear probing.
//!
//! FNV-1 over the identifier bytes, a short probe window, and capacity
//! doubling whenever an insert or a rehash runs out of probes.

use tsg_ast::Binding;

const INITIAL_HASH_BITS: u32 = 6;
const LINEAR_SEARCH_LIMIT: usize = 10;

#[derive(Debug, Clone)]
struct Record {
    key: String,
    binding: Binding,
}

#[derive(Debug)]
pub struct SymTbl {
    slots: Vec<Option<Record>>,
    hash_bits: u32,
}

impl SymTbl {
    pub fn new() -> Self {
        Self {
            slots: vec![None; 1 << INITIAL_HASH_BITS],
            hash_bits: INITIAL_HASH_BITS,
        }
    }

    /// Insert a fresh binding; `false` when the name is already present.
    pub fn insert(&mut self, name: &str, binding: Binding) -> bool {
        loop {
            match self.find_slot(name) {
                Some(index) => {
                    let slot = &mut self.slots[index];
                    if slot.is_some() {
                        return false;
                    }
                    *slot = Some(Record {
                        key: name.to_string(),
                        binding,
                    });
                    return true;
                }
                // probe window exhausted
                None => self.rehash(),
            }
        }
    }

    pub fn lookup(&self, name: &str) -> Option<Binding> {
        let index = self.find_slot(name)?;
        self.slots[index].as_ref().map(|record| record.binding)
    }

    /// First slot within the probe window that is empty or holds `name`;
    /// `None` when the window is full of other keys.
    fn find_slot(&self, name: &str) -> Option<usize> {
        let mask = self.slots.len() - 1;
        let base = fnv1(name.as_bytes()) as usize;

        for probe in 0..LINEAR_SEARCH_LIMIT {
            let index = (base + probe) & mask;
            match &self.slots[index] {
                None => return Some(index),
                Some(record) if record.key == name => return Some(index),
                Some(_) => {}
            }
        }
        None
    }

    fn rehash(&mut self) {
        let old = std::mem::take(&mut self.slots);
        let mut hash_bits = self.hash_bits;

        'grow: loop {
            hash_bits += 1;
            self.slots = vec![None; 1 << hash_bits];
            self.hash_bits = hash_bits;

            for record in old.iter().flatten() {
                match self.find_slot(&record.key) {
                    Some(index) => self.slots[index] = Some(record.clone()),
                    // still too crowded at this size
                    None => continue 'grow,
                }
            }
            return;
        }
    }
}

fn fnv1(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 14695981039346656037;
    for byte in bytes {
        hash = hash.wrapping_mul(1099511628211);
        hash ^= *byte as u64;
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;
    use tsg_ast::TyVar;

    fn binding(index: u32) -> Binding {
        Binding {
            depth: 0,
            index,
            tyvar: TyVar {
                set: 0,
                depth: 0,
                index,
            },
        }
    }

    #[test]
    fn test_insert_and_lookup() {
        let mut table = SymTbl::new();
        assert!(table.insert("x", binding(0)));
        assert!(table.insert("y", binding(1)));

        assert_eq!(table.lookup("x").unwrap().index, 0);
        assert_eq!(table.lookup("y").unwrap().index, 1);
        assert!(table.lookup("z").is_none());
    }

    #[test]
    fn test_duplicate_insert_fails() {
        let mut table = SymTbl::new();
        assert!(table.insert("x", binding(0)));
        assert!(!table.insert("x", binding(1)));
        assert_eq!(table.lookup("x").unwrap().index, 0);
    }

    #[test]
    fn test_rehash_keeps_entries() {
        let mut table = SymTbl::new();
        // enough keys to overflow the initial 64-slot table several times
        for i in 0..500 {
            assert!(table.insert(&format!("name_{i}"), binding(i)));
        }
        for i in 0..500 {
            assert_eq!(table.lookup(&format!("name_{i}")).unwrap().index, i);
        }
        assert!(table.lookup("name_500").is_none());
    }
}
