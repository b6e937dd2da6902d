use crate::error::{Error, Result, read_u32, read_u64};
use crate::types::{InternalKey, SequenceNumber};

/// Identifies one immutable table file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMetaData {
    pub number: u64,
    pub file_size: u64,
    pub smallest: InternalKey,
    pub largest: InternalKey,
}

/// A change to the set of live files and the recovery counters.
///
/// Encoding: a sequence of `tag(4B)` + field. Integers are fixed-width
/// little endian; strings and keys are `len(4B)` + bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionEdit {
    pub comparator: Option<String>,
    pub log_number: Option<u64>,
    pub next_file_number: Option<u64>,
    pub last_sequence: Option<SequenceNumber>,
    pub new_files: Vec<(u32, FileMetaData)>,
}

const TAG_COMPARATOR: u32 = 1;
const TAG_LOG_NUMBER: u32 = 2;
const TAG_NEXT_FILE_NUMBER: u32 = 3;
const TAG_LAST_SEQUENCE: u32 = 4;
const TAG_NEW_FILE: u32 = 7;

impl VersionEdit {
    pub fn set_comparator_name(&mut self, name: impl Into<String>) {
        self.comparator = Some(name.into());
    }

    pub fn set_log_number(&mut self, number: u64) {
        self.log_number = Some(number);
    }

    pub fn set_next_file(&mut self, number: u64) {
        self.next_file_number = Some(number);
    }

    pub fn set_last_sequence(&mut self, sequence: SequenceNumber) {
        self.last_sequence = Some(sequence);
    }

    pub fn add_file(&mut self, level: u32, meta: FileMetaData) {
        self.new_files.push((level, meta));
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        if let Some(name) = &self.comparator {
            put_u32(&mut buf, TAG_COMPARATOR);
            put_bytes(&mut buf, name.as_bytes());
        }
        for (tag, value) in [
            (TAG_LOG_NUMBER, self.log_number),
            (TAG_NEXT_FILE_NUMBER, self.next_file_number),
            (TAG_LAST_SEQUENCE, self.last_sequence),
        ] {
            if let Some(value) = value {
                put_u32(&mut buf, tag);
                buf.extend_from_slice(&value.to_le_bytes());
            }
        }
        for (level, f) in &self.new_files {
            put_u32(&mut buf, TAG_NEW_FILE);
            put_u32(&mut buf, *level);
            buf.extend_from_slice(&f.number.to_le_bytes());
            buf.extend_from_slice(&f.file_size.to_le_bytes());
            put_bytes(&mut buf, &f.smallest.encode());
            put_bytes(&mut buf, &f.largest.encode());
        }
        buf
    }

    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut edit = VersionEdit::default();
        let mut cursor = Cursor { data, offset: 0 };
        while cursor.offset < data.len() {
            match cursor.u32("tag")? {
                TAG_COMPARATOR => {
                    let name = cursor.bytes("comparator name")?;
                    let name = std::str::from_utf8(name)
                        .map_err(|_| Error::Corruption("comparator name is not UTF-8".into()))?;
                    edit.comparator = Some(name.to_string());
                }
                TAG_LOG_NUMBER => edit.log_number = Some(cursor.u64("log number")?),
                TAG_NEXT_FILE_NUMBER => edit.next_file_number = Some(cursor.u64("next file number")?),
                TAG_LAST_SEQUENCE => edit.last_sequence = Some(cursor.u64("last sequence")?),
                TAG_NEW_FILE => {
                    let level = cursor.u32("new-file level")?;
                    let number = cursor.u64("new-file number")?;
                    let file_size = cursor.u64("new-file size")?;
                    let smallest = InternalKey::decode(cursor.bytes("new-file smallest key")?)?;
                    let largest = InternalKey::decode(cursor.bytes("new-file largest key")?)?;
                    edit.new_files.push((
                        level,
                        FileMetaData {
                            number,
                            file_size,
                            smallest,
                            largest,
                        },
                    ));
                }
                tag => return Err(Error::Corruption(format!("unknown VersionEdit tag: {tag}"))),
            }
        }
        Ok(edit)
    }
}

fn put_u32(buf: &mut Vec<u8>, value: u32) {
    buf.extend_from_slice(&value.to_le_bytes());
}

fn put_bytes(buf: &mut Vec<u8>, bytes: &[u8]) {
    put_u32(buf, bytes.len() as u32);
    buf.extend_from_slice(bytes);
}

struct Cursor<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Cursor<'a> {
    fn u32(&mut self, what: &str) -> Result<u32> {
        let value = read_u32(self.data, self.offset, what)?;
        self.offset += 4;
        Ok(value)
    }

    fn u64(&mut self, what: &str) -> Result<u64> {
        let value = read_u64(self.data, self.offset, what)?;
        self.offset += 8;
        Ok(value)
    }

    fn bytes(&mut self, what: &str) -> Result<&'a [u8]> {
        let len = self.u32(what)? as usize;
        let bytes = self
            .data
            .get(self.offset..self.offset + len)
            .ok_or_else(|| Error::Corruption(format!("{what} truncated")))?;
        self.offset += len;
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ValueType;

    fn file(number: u64) -> FileMetaData {
        FileMetaData {
            number,
            file_size: 1000 + number,
            smallest: InternalKey::new(b"a".to_vec(), 5, ValueType::Put),
            largest: InternalKey::new(b"z".to_vec(), 1, ValueType::Delete),
        }
    }

    #[test]
    fn repair_edit_decodes_to_same_fields() {
        let mut edit = VersionEdit::default();
        edit.set_comparator_name("leveldb.BytewiseComparator");
        edit.set_log_number(0);
        edit.set_next_file(9);
        edit.set_last_sequence(77);
        edit.add_file(0, file(3));
        edit.add_file(0, file(8));

        let decoded = VersionEdit::decode(&edit.encode()).unwrap();
        assert_eq!(decoded, edit);
    }

    #[test]
    fn absent_fields_stay_absent() {
        let mut edit = VersionEdit::default();
        edit.set_last_sequence(4);
        let decoded = VersionEdit::decode(&edit.encode()).unwrap();
        assert_eq!(decoded.comparator, None);
        assert_eq!(decoded.log_number, None);
        assert_eq!(decoded.last_sequence, Some(4));
    }

    #[test]
    fn unknown_tag_and_truncation_are_corruption() {
        assert!(VersionEdit::decode(&99u32.to_le_bytes()).is_err());

        let mut edit = VersionEdit::default();
        edit.add_file(0, file(1));
        let encoded = edit.encode();
        assert!(VersionEdit::decode(&encoded[..encoded.len() - 3]).is_err());
    }
}
