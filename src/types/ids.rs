use core::fmt;
use core::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NetworkId(pub u32);

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Bssid(pub [u8; 6]);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BssidParseError;

impl fmt::Display for BssidParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("invalid bssid")
    }
}

impl std::error::Error for BssidParseError {}

impl FromStr for Bssid {
    type Err = BssidParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut octets = [0u8; 6];
        let mut parts = s.split(':');
        for octet in &mut octets {
            let part = parts.next().ok_or(BssidParseError)?;
            if part.len() != 2 {
                return Err(BssidParseError);
            }
            *octet = u8::from_str_radix(part, 16).map_err(|_| BssidParseError)?;
        }
        if parts.next().is_some() {
            return Err(BssidParseError);
        }
        Ok(Self(octets))
    }
}

impl fmt::Display for Bssid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

// Zero is reserved for follow-up requests the station posts to itself; their
// replies are never surfaced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(pub u32);

impl RequestId {
    pub const INTERNAL: Self = Self(0);

    pub const fn is_internal(self) -> bool {
        self.0 == 0
    }
}

// Per-user application uid ranges are 100_000 wide.
const PER_USER_RANGE: u32 = 100_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CallerIdentity {
    pub uid: u32,
    pub user_id: u32,
}

impl CallerIdentity {
    pub const SYSTEM: Self = Self {
        uid: 1_000,
        user_id: 0,
    };

    pub const fn from_uid(uid: u32) -> Self {
        Self {
            uid,
            user_id: uid / PER_USER_RANGE,
        }
    }
}
