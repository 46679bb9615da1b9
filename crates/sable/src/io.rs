//! JSON interchange of action tables.
//!
//! States and actions are stored in their compact textual forms, so the
//! file stays readable and does not depend on state numbering.

use crate::{
    table::{ActionTable, StateId, StateKey, TableFormatError},
    types::Map,
};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    io::{self, BufWriter, Write},
    path::Path,
};

#[derive(Serialize, Deserialize)]
struct TableDisk {
    start_symbol: String,
    states: Vec<StateDisk>,
}

#[derive(Serialize, Deserialize)]
struct StateDisk {
    name: String,
    actions: Map<String, String>,
}

impl From<&ActionTable> for TableDisk {
    fn from(t: &ActionTable) -> Self {
        let states = t
            .states()
            .map(|(id, _)| StateDisk {
                name: t.state_name(id),
                actions: t
                    .actions(id)
                    .map(|(symbol, action)| (symbol.to_owned(), t.encode_action(action)))
                    .collect(),
            })
            .collect();
        Self {
            start_symbol: t.start_symbol().to_owned(),
            states,
        }
    }
}

impl TableDisk {
    fn into_table(self) -> Result<ActionTable, TableFormatError> {
        // First pass: register every state so that shifts can refer forward.
        let mut states = Map::default();
        for state in &self.states {
            let key = StateKey::decode(&state.name, &self.start_symbol)
                .ok_or_else(|| TableFormatError::InvalidStateName(state.name.clone()))?;
            if states.insert(key, Map::default()).is_some() {
                return Err(TableFormatError::DuplicateState(state.name.clone()));
            }
        }
        if !matches!(states.get_index(0), Some((StateKey::Start, _))) {
            return Err(TableFormatError::MissingStart);
        }

        let mut table = ActionTable::new(self.start_symbol, states);
        for (i, state) in self.states.into_iter().enumerate() {
            let id = StateId::from_index(i);
            for (symbol, text) in state.actions {
                let action = table.decode_action(&text)?;
                table.insert(id, symbol, action);
            }
        }
        Ok(table)
    }
}

impl ActionTable {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&TableDisk::from(self))
    }

    pub fn from_json(data: &str) -> Result<Self, TableFormatError> {
        serde_json::from_str::<TableDisk>(data)?.into_table()
    }

    pub fn save_json(&self, path: &Path) -> io::Result<()> {
        let f = fs::File::create(path)?;
        let mut w = BufWriter::new(f);
        serde_json::to_writer_pretty(&mut w, &TableDisk::from(self))?;
        w.flush()
    }

    pub fn load_json(path: &Path) -> Result<Self, TableFormatError> {
        let data = fs::read(path).map_err(serde_json::Error::io)?;
        serde_json::from_slice::<TableDisk>(&data)?.into_table()
    }
}
