use uuid::Uuid;

const UNIT_NAMESPACE: u64 = 0x554E_4954; // "UNIT"
const SESSION_NAMESPACE: u64 = 0x5345_5353; // "SESS"

fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

pub fn uuid_v4_from_seed(seed: u64, namespace: u64, index: u64) -> Uuid {
    let hi = splitmix64(seed ^ namespace);
    let lo = splitmix64(seed ^ namespace.rotate_left(17) ^ index);
    let mut bytes = (((hi as u128) << 64) | (lo as u128)).to_be_bytes();

    // Set RFC4122 variant and v4 version bits.
    bytes[6] = (bytes[6] & 0x0F) | 0x40;
    bytes[8] = (bytes[8] & 0x3F) | 0x80;

    Uuid::from_bytes(bytes)
}

/// 프로세스 단위로 유닛/세션 ID 를 발급합니다.
///
/// 같은 seed 로 같은 순서의 요청을 재생하면 같은 ID 가 나온다.
/// 유닛의 `seq` 는 생성 순서 그 자체이며 전투 해석 순서와 동점 처리에 쓰인다.
#[derive(Debug, Clone)]
pub struct IdGenerator {
    seed: u64,
    next_unit: u64,
    next_session: u64,
}

impl IdGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            next_unit: 0,
            next_session: 0,
        }
    }

    /// (unit id, creation seq)
    pub fn next_unit(&mut self) -> (Uuid, u64) {
        let seq = self.next_unit;
        self.next_unit += 1;
        (uuid_v4_from_seed(self.seed, UNIT_NAMESPACE, seq), seq)
    }

    pub fn next_session(&mut self) -> Uuid {
        let index = self.next_session;
        self.next_session += 1;
        uuid_v4_from_seed(self.seed, SESSION_NAMESPACE, index)
    }
}
