//! Protocol enumerations with their wire discriminants.
//!
//! Discriminants are fixed by the broadcasting interface; an out-of-range
//! value fails the datagram with the matching [`DecodeError`] variant.

use serde::{Deserialize, Serialize};

use crate::DecodeError;

/// Session type (non-contiguous discriminants on the wire).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum SessionType {
    Practice = 0,
    Qualifying = 4,
    Superpole = 9,
    Race = 10,
    Hotlap = 11,
    Hotstint = 12,
    HotlapSuperpole = 13,
    Replay = 14,
    #[default]
    None = 15,
}

impl SessionType {
    pub fn to_wire(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for SessionType {
    type Error = DecodeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Practice),
            4 => Ok(Self::Qualifying),
            9 => Ok(Self::Superpole),
            10 => Ok(Self::Race),
            11 => Ok(Self::Hotlap),
            12 => Ok(Self::Hotstint),
            13 => Ok(Self::HotlapSuperpole),
            14 => Ok(Self::Replay),
            15 => Ok(Self::None),
            other => Err(DecodeError::UnknownSessionType(other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum SessionPhase {
    #[default]
    None = 0,
    Starting = 1,
    PreFormation = 2,
    FormationLap = 3,
    PreSession = 4,
    Session = 5,
    SessionOver = 6,
    PostSession = 7,
    ResultUi = 8,
}

impl SessionPhase {
    pub fn to_wire(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for SessionPhase {
    type Error = DecodeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::None),
            1 => Ok(Self::Starting),
            2 => Ok(Self::PreFormation),
            3 => Ok(Self::FormationLap),
            4 => Ok(Self::PreSession),
            5 => Ok(Self::Session),
            6 => Ok(Self::SessionOver),
            7 => Ok(Self::PostSession),
            8 => Ok(Self::ResultUi),
            other => Err(DecodeError::UnknownSessionPhase(other)),
        }
    }
}

/// Where a car currently is on the circuit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum CarLocation {
    #[default]
    None = 0,
    Track = 1,
    Pitlane = 2,
    PitEntry = 3,
    PitExit = 4,
}

impl CarLocation {
    pub fn to_wire(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for CarLocation {
    type Error = DecodeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::None),
            1 => Ok(Self::Track),
            2 => Ok(Self::Pitlane),
            3 => Ok(Self::PitEntry),
            4 => Ok(Self::PitExit),
            other => Err(DecodeError::UnknownCarLocation(other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum DriverCategory {
    #[default]
    Bronze = 0,
    Silver = 1,
    Gold = 2,
    Platinum = 3,
}

impl DriverCategory {
    pub fn to_wire(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for DriverCategory {
    type Error = DecodeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Bronze),
            1 => Ok(Self::Silver),
            2 => Ok(Self::Gold),
            3 => Ok(Self::Platinum),
            other => Err(DecodeError::UnknownDriverCategory(other)),
        }
    }
}

/// Cup (class) a car competes in. `National` doubles as the placeholder
/// category when no roster data is available for a car.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum CupCategory {
    Pro = 0,
    ProAm = 1,
    Am = 2,
    Silver = 3,
    #[default]
    National = 4,
}

impl CupCategory {
    pub fn to_wire(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for CupCategory {
    type Error = DecodeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Pro),
            1 => Ok(Self::ProAm),
            2 => Ok(Self::Am),
            3 => Ok(Self::Silver),
            4 => Ok(Self::National),
            other => Err(DecodeError::UnknownCupCategory(other)),
        }
    }
}

/// How a completed lap is classified.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LapKind {
    OutLap,
    InLap,
    #[default]
    Regular,
}

/// Driver and team nationalities as numbered by the game.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u16)]
pub enum Nationality {
    #[default]
    Any = 0,
    Italy = 1,
    Germany = 2,
    France = 3,
    Spain = 4,
    GreatBritain = 5,
    Hungary = 6,
    Belgium = 7,
    Switzerland = 8,
    Austria = 9,
    Russia = 10,
    Thailand = 11,
    Netherlands = 12,
    Poland = 13,
    Argentina = 14,
    Monaco = 15,
    Ireland = 16,
    Brazil = 17,
    SouthAfrica = 18,
    PuertoRico = 19,
    Slovakia = 20,
    Oman = 21,
    Greece = 22,
    SaudiArabia = 23,
    Norway = 24,
    Turkey = 25,
    SouthKorea = 26,
    Lebanon = 27,
    Armenia = 28,
    Mexico = 29,
    Sweden = 30,
    Finland = 31,
    Denmark = 32,
    Croatia = 33,
    Canada = 34,
    China = 35,
    Portugal = 36,
    Singapore = 37,
    Indonesia = 38,
    Usa = 39,
    NewZealand = 40,
    Australia = 41,
    SanMarino = 42,
    Uae = 43,
    Luxembourg = 44,
    Kuwait = 45,
    HongKong = 46,
    Colombia = 47,
    Japan = 48,
    Andorra = 49,
    Azerbaijan = 50,
    Bulgaria = 51,
    Cuba = 52,
    CzechRepublic = 53,
    Estonia = 54,
    Georgia = 55,
    India = 56,
    Israel = 57,
    Jamaica = 58,
    Latvia = 59,
    Lithuania = 60,
    Macau = 61,
    Malaysia = 62,
    Nepal = 63,
    NewCaledonia = 64,
    Nigeria = 65,
    NorthernIreland = 66,
    PapuaNewGuinea = 67,
    Philippines = 68,
    Qatar = 69,
    Romania = 70,
    Scotland = 71,
    Serbia = 72,
    Slovenia = 73,
    Taiwan = 74,
    Ukraine = 75,
    Venezuela = 76,
    Wales = 77,
    Iran = 78,
    Bahrain = 79,
    Zimbabwe = 80,
    ChineseTaipei = 81,
    Chile = 82,
    Uruguay = 83,
    Madagascar = 84,
}

impl Nationality {
    pub fn to_wire(self) -> u16 {
        self as u16
    }
}

impl TryFrom<u16> for Nationality {
    type Error = DecodeError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        const TABLE: [Nationality; 85] = [
            Nationality::Any,
            Nationality::Italy,
            Nationality::Germany,
            Nationality::France,
            Nationality::Spain,
            Nationality::GreatBritain,
            Nationality::Hungary,
            Nationality::Belgium,
            Nationality::Switzerland,
            Nationality::Austria,
            Nationality::Russia,
            Nationality::Thailand,
            Nationality::Netherlands,
            Nationality::Poland,
            Nationality::Argentina,
            Nationality::Monaco,
            Nationality::Ireland,
            Nationality::Brazil,
            Nationality::SouthAfrica,
            Nationality::PuertoRico,
            Nationality::Slovakia,
            Nationality::Oman,
            Nationality::Greece,
            Nationality::SaudiArabia,
            Nationality::Norway,
            Nationality::Turkey,
            Nationality::SouthKorea,
            Nationality::Lebanon,
            Nationality::Armenia,
            Nationality::Mexico,
            Nationality::Sweden,
            Nationality::Finland,
            Nationality::Denmark,
            Nationality::Croatia,
            Nationality::Canada,
            Nationality::China,
            Nationality::Portugal,
            Nationality::Singapore,
            Nationality::Indonesia,
            Nationality::Usa,
            Nationality::NewZealand,
            Nationality::Australia,
            Nationality::SanMarino,
            Nationality::Uae,
            Nationality::Luxembourg,
            Nationality::Kuwait,
            Nationality::HongKong,
            Nationality::Colombia,
            Nationality::Japan,
            Nationality::Andorra,
            Nationality::Azerbaijan,
            Nationality::Bulgaria,
            Nationality::Cuba,
            Nationality::CzechRepublic,
            Nationality::Estonia,
            Nationality::Georgia,
            Nationality::India,
            Nationality::Israel,
            Nationality::Jamaica,
            Nationality::Latvia,
            Nationality::Lithuania,
            Nationality::Macau,
            Nationality::Malaysia,
            Nationality::Nepal,
            Nationality::NewCaledonia,
            Nationality::Nigeria,
            Nationality::NorthernIreland,
            Nationality::PapuaNewGuinea,
            Nationality::Philippines,
            Nationality::Qatar,
            Nationality::Romania,
            Nationality::Scotland,
            Nationality::Serbia,
            Nationality::Slovenia,
            Nationality::Taiwan,
            Nationality::Ukraine,
            Nationality::Venezuela,
            Nationality::Wales,
            Nationality::Iran,
            Nationality::Bahrain,
            Nationality::Zimbabwe,
            Nationality::ChineseTaipei,
            Nationality::Chile,
            Nationality::Uruguay,
            Nationality::Madagascar,
        ];
        TABLE
            .get(usize::from(value))
            .copied()
            .ok_or(DecodeError::UnknownNationality(value))
    }
}
