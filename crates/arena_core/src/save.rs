//! Fixed-record save file.
//!
//! Layout, all integers little-endian `i32`:
//!
//! ```text
//! header   count_team1 | count_team2 | active_team
//! record   name[101] (NUL padded) | pad[3] | health | item1 | item2
//! ```
//!
//! `count_team1` records follow the header, then `count_team2` records.
//! Items are stored as catalog indices; `-1` means an empty slot. Records are
//! 116 bytes each.
//!
//! Loading validates everything before returning, so a failed load never
//! leaves a half-restored battle behind. Saving writes to a temporary file
//! next to the target and renames it into place.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::army::{MAX_ARMY, MIN_ARMY};
use crate::error::SaveError;
use crate::grid::Team;
use crate::items::ItemId;
use crate::unit::{Unit, MAX_NAME_LEN};

/// Bytes reserved for a name, including the terminating NUL.
pub const NAME_FIELD_LEN: usize = MAX_NAME_LEN + 1;

/// Alignment padding after the name field.
const NAME_PADDING: usize = 3;

/// Size of the header in bytes.
pub const HEADER_LEN: usize = 12;

/// Size of one unit record in bytes.
pub const RECORD_LEN: usize = NAME_FIELD_LEN + NAME_PADDING + 12;

/// Stored index of an empty item slot.
const NO_ITEM: i32 = -1;

/// Contents of a save file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveData {
    /// Live units of each team, indexed by [`Team::index`], in roster order.
    pub armies: [Vec<Unit>; 2],
    /// Team to act after loading.
    pub active_team: Team,
}

impl SaveData {
    /// Units of one team.
    #[must_use]
    pub fn army(&self, team: Team) -> &[Unit] {
        &self.armies[team.index()]
    }
}

/// Encode save data.
///
/// # Errors
///
/// [`SaveError::ArmySize`] if either army is empty or larger than five,
/// [`SaveError::DefeatedUnit`] if a unit has no health left.
pub fn encode(data: &SaveData) -> Result<Vec<u8>, SaveError> {
    for army in &data.armies {
        check_army_size(army.len() as i32)?;
    }
    for unit in data.armies.iter().flatten() {
        check_alive(unit.name(), unit.health)?;
    }

    let records = data.armies.iter().map(Vec::len).sum::<usize>();
    let mut out = Vec::with_capacity(HEADER_LEN + records * RECORD_LEN);
    for army in &data.armies {
        out.extend_from_slice(&(army.len() as i32).to_le_bytes());
    }
    out.extend_from_slice(&data.active_team.number().to_le_bytes());

    for unit in data.armies.iter().flatten() {
        let mut name = [0u8; NAME_FIELD_LEN];
        let bytes = unit.name().as_bytes();
        let len = bytes.len().min(MAX_NAME_LEN);
        name[..len].copy_from_slice(&bytes[..len]);

        out.extend_from_slice(&name);
        out.extend_from_slice(&[0u8; NAME_PADDING]);
        out.extend_from_slice(&unit.health.to_le_bytes());
        out.extend_from_slice(&(unit.primary().index() as i32).to_le_bytes());
        let secondary = unit.secondary().map_or(NO_ITEM, |id| id.index() as i32);
        out.extend_from_slice(&secondary.to_le_bytes());
    }
    Ok(out)
}

/// Decode save data.
///
/// # Errors
///
/// - [`SaveError::ShortRead`] if the data ends early
/// - [`SaveError::ArmySize`] if a team count is outside `1..=5`
/// - [`SaveError::ActiveTeam`] if the active team is neither 1 nor 2
/// - [`SaveError::DefeatedUnit`] if a stored health is zero or below
/// - [`SaveError::PrimaryItem`] if a slot-1 index is not in the catalog
/// - [`SaveError::InvalidUnit`] if a loadout needs more than two slots
pub fn decode(bytes: &[u8]) -> Result<SaveData, SaveError> {
    let mut reader = Reader { bytes, offset: 0 };

    let count_one = reader.i32()?;
    let count_two = reader.i32()?;
    let active = reader.i32()?;
    let counts = [check_army_size(count_one)?, check_army_size(count_two)?];
    let active_team = Team::from_number(active).ok_or(SaveError::ActiveTeam(active))?;

    let mut armies: [Vec<Unit>; 2] = [Vec::new(), Vec::new()];
    for (army, count) in armies.iter_mut().zip(counts) {
        for _ in 0..count {
            army.push(reader.unit()?);
        }
    }

    Ok(SaveData {
        armies,
        active_team,
    })
}

/// Write a save file atomically.
///
/// # Errors
///
/// Encoding errors, or any IO error while writing or renaming.
pub fn save_to_path(path: &Path, data: &SaveData) -> Result<(), SaveError> {
    let bytes = encode(data)?;
    let tmp = temp_path(path);

    let written = (|| -> std::io::Result<()> {
        let mut file = fs::File::create(&tmp)?;
        file.write_all(&bytes)?;
        file.sync_all()?;
        fs::rename(&tmp, path)
    })();

    if let Err(err) = written {
        // Best effort: the target itself was never touched.
        let _ = fs::remove_file(&tmp);
        tracing::warn!(path = %path.display(), error = %err, "Save failed");
        return Err(err.into());
    }

    tracing::info!(path = %path.display(), bytes = bytes.len(), "Game saved");
    Ok(())
}

/// Read and decode a save file.
///
/// # Errors
///
/// Any IO error, or any error from [`decode`].
pub fn load_from_path(path: &Path) -> Result<SaveData, SaveError> {
    let bytes = fs::read(path)?;
    decode(&bytes).map_err(|err| {
        tracing::warn!(path = %path.display(), error = %err, "Rejected save file");
        err
    })
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

fn check_alive(name: &str, health: i32) -> Result<(), SaveError> {
    if health > 0 {
        Ok(())
    } else {
        Err(SaveError::DefeatedUnit {
            name: name.to_string(),
            health,
        })
    }
}

fn check_army_size(count: i32) -> Result<usize, SaveError> {
    usize::try_from(count)
        .ok()
        .filter(|n| (MIN_ARMY..=MAX_ARMY).contains(n))
        .ok_or(SaveError::ArmySize(count))
}

struct Reader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, needed: usize) -> Result<&'a [u8], SaveError> {
        let end = self.offset + needed;
        let chunk = self.bytes.get(self.offset..end).ok_or(SaveError::ShortRead {
            offset: self.offset,
            needed,
        })?;
        self.offset = end;
        Ok(chunk)
    }

    fn i32(&mut self) -> Result<i32, SaveError> {
        let mut raw = [0u8; 4];
        raw.copy_from_slice(self.take(4)?);
        Ok(i32::from_le_bytes(raw))
    }

    fn unit(&mut self) -> Result<Unit, SaveError> {
        let offset = self.offset;
        // Read the whole record up front so a truncated one reports its start.
        if self.bytes.len() < offset + RECORD_LEN {
            return Err(SaveError::ShortRead {
                offset,
                needed: RECORD_LEN,
            });
        }

        let raw_name = self.take(NAME_FIELD_LEN)?;
        let end = raw_name.iter().position(|&b| b == 0).unwrap_or(MAX_NAME_LEN);
        let name = String::from_utf8_lossy(&raw_name[..end]).into_owned();
        self.take(NAME_PADDING)?;

        let health = self.i32()?;
        let primary_index = self.i32()?;
        let secondary_index = self.i32()?;
        check_alive(&name, health)?;

        let primary = ItemId::from_index(primary_index).ok_or_else(|| SaveError::PrimaryItem {
            name: name.clone(),
            index: primary_index,
        })?;
        let secondary = ItemId::from_index(secondary_index);
        Ok(Unit::with_health(name, health, primary, secondary)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::find_item;

    fn unit(name: &str, primary: &str, secondary: Option<&str>, health: i32) -> Unit {
        Unit::with_health(
            name,
            health,
            find_item(primary).unwrap(),
            secondary.map(|s| find_item(s).unwrap()),
        )
        .unwrap()
    }

    fn sample() -> SaveData {
        SaveData {
            armies: [
                vec![unit("Ada", "Sword", Some("Shield"), 100)],
                vec![
                    unit("Bo", "Bow", None, 42),
                    unit("Cy", "Ice Staff", None, 3),
                ],
            ],
            active_team: Team::Two,
        }
    }

    #[test]
    fn test_record_layout() {
        assert_eq!(RECORD_LEN, 116);
        let bytes = encode(&sample()).unwrap();
        assert_eq!(bytes.len(), HEADER_LEN + 3 * RECORD_LEN);
        assert_eq!(&bytes[0..4], &1i32.to_le_bytes());
        assert_eq!(&bytes[4..8], &2i32.to_le_bytes());
        assert_eq!(&bytes[8..12], &2i32.to_le_bytes());
        assert_eq!(&bytes[12..15], b"Ada");
        assert_eq!(bytes[15], 0);

        let fields = HEADER_LEN + NAME_FIELD_LEN + NAME_PADDING;
        assert_eq!(&bytes[fields..fields + 4], &100i32.to_le_bytes());
        assert_eq!(&bytes[fields + 4..fields + 8], &0i32.to_le_bytes());
        assert_eq!(&bytes[fields + 8..fields + 12], &1i32.to_le_bytes());
    }

    #[test]
    fn test_decode_restores_units() {
        let data = sample();
        let decoded = decode(&encode(&data).unwrap()).unwrap();
        assert_eq!(decoded, data);
        assert_eq!(decoded.army(Team::Two)[1].health, 3);
    }

    #[test]
    fn test_truncated_file_is_rejected() {
        let bytes = encode(&sample()).unwrap();
        let err = decode(&bytes[..bytes.len() - 1]).unwrap_err();
        assert!(matches!(
            err,
            SaveError::ShortRead {
                needed: RECORD_LEN,
                ..
            }
        ));
        assert!(matches!(decode(&bytes[..6]), Err(SaveError::ShortRead { offset: 4, .. })));
    }

    #[test]
    fn test_army_size_out_of_range() {
        let mut bytes = encode(&sample()).unwrap();
        bytes[0..4].copy_from_slice(&6i32.to_le_bytes());
        assert!(matches!(decode(&bytes), Err(SaveError::ArmySize(6))));
        bytes[0..4].copy_from_slice(&0i32.to_le_bytes());
        assert!(matches!(decode(&bytes), Err(SaveError::ArmySize(0))));

        let empty = SaveData {
            armies: [Vec::new(), vec![unit("x", "Sword", None, 1)]],
            active_team: Team::One,
        };
        assert!(matches!(encode(&empty), Err(SaveError::ArmySize(0))));
    }

    #[test]
    fn test_bad_active_team() {
        let mut bytes = encode(&sample()).unwrap();
        bytes[8..12].copy_from_slice(&3i32.to_le_bytes());
        assert!(matches!(decode(&bytes), Err(SaveError::ActiveTeam(3))));
    }

    #[test]
    fn test_item_indices() {
        let mut bytes = encode(&sample()).unwrap();
        let fields = HEADER_LEN + NAME_FIELD_LEN + NAME_PADDING;

        // Out-of-range secondary reads as an empty slot.
        bytes[fields + 8..fields + 12].copy_from_slice(&99i32.to_le_bytes());
        let data = decode(&bytes).unwrap();
        assert_eq!(data.army(Team::One)[0].secondary(), None);

        // Out-of-range primary fails the load.
        bytes[fields + 4..fields + 8].copy_from_slice(&(-1i32).to_le_bytes());
        assert!(matches!(
            decode(&bytes),
            Err(SaveError::PrimaryItem { index: -1, .. })
        ));
    }

    #[test]
    fn test_overfull_loadout_rejected() {
        let mut bytes = encode(&sample()).unwrap();
        let fields = HEADER_LEN + NAME_FIELD_LEN + NAME_PADDING;
        let greatsword = find_item("Greatsword").unwrap().index() as i32;
        bytes[fields + 4..fields + 8].copy_from_slice(&greatsword.to_le_bytes());
        assert!(matches!(decode(&bytes), Err(SaveError::InvalidUnit(_))));
    }

    #[test]
    fn test_defeated_unit_rejected() {
        let mut bytes = encode(&sample()).unwrap();
        let health = HEADER_LEN + 2 * RECORD_LEN + NAME_FIELD_LEN + NAME_PADDING;
        bytes[health..health + 4].copy_from_slice(&0i32.to_le_bytes());
        assert!(matches!(
            decode(&bytes),
            Err(SaveError::DefeatedUnit { ref name, health: 0 }) if name == "Cy"
        ));

        let mut data = sample();
        data.armies[0][0].health = -5;
        assert!(matches!(
            encode(&data),
            Err(SaveError::DefeatedUnit { health: -5, .. })
        ));
    }

    #[test]
    fn test_temp_path_is_sibling() {
        let tmp = temp_path(Path::new("/saves/battle.sav"));
        assert_eq!(tmp, PathBuf::from("/saves/battle.sav.tmp"));
    }
}
