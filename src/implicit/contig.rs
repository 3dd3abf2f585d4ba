use crate::types::HashMap;

/// One entry in the contig dictionary: a name, its assigned id, and the
/// `[offset, offset + count)` slice of the records array it owns once
/// indexed.
pub(crate) struct ContigInfo {
    pub(crate) name: Box<[u8]>,
    pub(crate) offset: u32,
    pub(crate) count: u32,
}

/// Name -> id dictionary plus per-id metadata, shared by all `add`-time
/// and `index`-time bookkeeping.
#[derive(Default)]
pub(crate) struct ContigTable {
    pub(crate) by_id: Vec<ContigInfo>,
    pub(crate) by_name: HashMap<Box<[u8]>, u32>,
}

impl ContigTable {
    pub(crate) fn id_of(&self, name: &[u8]) -> Option<u32> {
        self.by_name.get(name).copied()
    }

    pub(crate) fn ensure(&mut self, name: &[u8]) -> u32 {
        if let Some(&id) = self.by_name.get(name) {
            return id;
        }
        let id = self.by_id.len() as u32;
        self.by_name.insert(name.into(), id);
        self.by_id.push(ContigInfo {
            name: name.into(),
            offset: 0,
            count: 0,
        });
        id
    }
}
