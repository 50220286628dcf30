/*
Note Catalog
============

The keyboard exposes thirteen keys spanning one octave plus one: eight
natural notes (C-3 through C-4) followed by five sharps (C#3 through A#3).
The catalog order matches the key layout, so the *index* into this table is
the stable trigger key used by `SynthEngine::note_on`.

Frequencies are equal-temperament values with A4 = 440 Hz:

  index  label  freq (Hz)        index  label  freq (Hz)
    0    C-3    130.81             8    C#3    138.59
    1    D-3    146.83             9    D#3    155.56
    2    E-3    164.81            10    F#3    185.00
    3    F-3    174.61            11    G#3    207.65
    4    G-3    196.00            12    A#3    233.08
    5    A-3    220.00
    6    B-3    246.94
    7    C-4    261.63

Invariant: frequencies strictly increase within the natural subset and within
the sharp subset (the two subsets interleave on a real keyboard).
*/

use crate::error::SynthError;

/// One key of the keyboard: fundamental frequency, display label, and
/// whether it is a sharp (black) key.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Note {
    pub frequency: f32,
    pub label: &'static str,
    pub is_sharp: bool,
}

const NOTES: [Note; 13] = [
    Note { frequency: 130.81, label: "C-3", is_sharp: false },
    Note { frequency: 146.83, label: "D-3", is_sharp: false },
    Note { frequency: 164.81, label: "E-3", is_sharp: false },
    Note { frequency: 174.61, label: "F-3", is_sharp: false },
    Note { frequency: 196.0, label: "G-3", is_sharp: false },
    Note { frequency: 220.0, label: "A-3", is_sharp: false },
    Note { frequency: 246.94, label: "B-3", is_sharp: false },
    Note { frequency: 261.63, label: "C-4", is_sharp: false },
    Note { frequency: 138.59, label: "C#3", is_sharp: true },
    Note { frequency: 155.56, label: "D#3", is_sharp: true },
    Note { frequency: 185.0, label: "F#3", is_sharp: true },
    Note { frequency: 207.65, label: "G#3", is_sharp: true },
    Note { frequency: 233.08, label: "A#3", is_sharp: true },
];

/// The full ordered catalog, natural keys first.
pub fn catalog() -> &'static [Note] {
    &NOTES
}

fn lookup(index: usize) -> Result<&'static Note, SynthError> {
    NOTES.get(index).ok_or(SynthError::NoteIndex {
        index,
        len: NOTES.len(),
    })
}

/// Fundamental frequency in Hz for a note index.
pub fn frequency_of(index: usize) -> Result<f32, SynthError> {
    lookup(index).map(|n| n.frequency)
}

/// Display label for a note index (e.g. `"A-3"`).
pub fn label_of(index: usize) -> Result<&'static str, SynthError> {
    lookup(index).map(|n| n.label)
}

/// Whether the note at this index is a sharp (black) key.
pub fn is_sharp_at(index: usize) -> Result<bool, SynthError> {
    lookup(index).map(|n| n.is_sharp)
}
