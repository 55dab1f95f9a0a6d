//! Fixed draw-number → animal table for Lotto Activo.
//!
//! The table has 38 entries: roulette-style "0" and "00" are distinct draws
//! (DELFIN and BALLENA), then "01" through "36". It is built once and shared;
//! nothing recomputes it per row.

use std::collections::HashMap;
use std::sync::OnceLock;

/// All valid `(number, animal)` pairs, in draw order.
pub const ANIMAL_TABLE: &[(&str, &str)] = &[
    ("0", "DELFIN"),
    ("00", "BALLENA"),
    ("01", "CARNERO"),
    ("02", "TORO"),
    ("03", "CIEMPIES"),
    ("04", "ALACRAN"),
    ("05", "LEON"),
    ("06", "RANA"),
    ("07", "PERICO"),
    ("08", "RATON"),
    ("09", "AGUILA"),
    ("10", "TIGRE"),
    ("11", "GATO"),
    ("12", "CABALLO"),
    ("13", "MONO"),
    ("14", "PALOMA"),
    ("15", "ZORRO"),
    ("16", "OSO"),
    ("17", "PAVO"),
    ("18", "BURRO"),
    ("19", "CHIVO"),
    ("20", "COCHINO"),
    ("21", "GALLO"),
    ("22", "CAMELLO"),
    ("23", "CEBRA"),
    ("24", "IGUANA"),
    ("25", "GALLINA"),
    ("26", "VACA"),
    ("27", "PERRO"),
    ("28", "ZAMURO"),
    ("29", "ELEFANTE"),
    ("30", "CAIMAN"),
    ("31", "LAPA"),
    ("32", "ARDILLA"),
    ("33", "PESCADO"),
    ("34", "VENADO"),
    ("35", "JIRAFA"),
    ("36", "CULEBRA"),
];

fn number_to_animal() -> &'static HashMap<&'static str, &'static str> {
    static MAP: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    MAP.get_or_init(|| ANIMAL_TABLE.iter().copied().collect())
}

fn animal_to_number() -> &'static HashMap<&'static str, &'static str> {
    static MAP: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    MAP.get_or_init(|| ANIMAL_TABLE.iter().map(|&(n, a)| (a, n)).collect())
}

/// Animal for a draw-number key, if the key is in the table.
pub fn animal_for_number(number: &str) -> Option<&'static str> {
    number_to_animal().get(number).copied()
}

/// Draw-number key for an animal label, if the label is in the table.
pub fn number_for_animal(animal: &str) -> Option<&'static str> {
    animal_to_number().get(animal).copied()
}

/// Whether `animal` is one of the 38 valid labels.
pub fn is_valid_animal(animal: &str) -> bool {
    animal_to_number().contains_key(animal)
}

/// Upper-case and strip Spanish diacritics so "León" matches "LEON".
pub fn fold_label(raw: &str) -> String {
    raw.trim()
        .chars()
        .flat_map(char::to_uppercase)
        .map(|c| match c {
            'Á' => 'A',
            'É' => 'E',
            'Í' => 'I',
            'Ó' => 'O',
            'Ú' | 'Ü' => 'U',
            'Ñ' => 'N',
            other => other,
        })
        .collect()
}
