pub mod network {
    pub const DEFAULT_PORT: u16 = 443;
    pub const DEFAULT_TIMEOUT_MS: u64 = 3_000;
    pub const USER_AGENT: &str = concat!("fgt-api/", env!("CARGO_PKG_VERSION"));
}

pub mod limits {
    pub const MAX_PORT: u16 = 65_535;
    pub const MIN_PORT: u16 = 1;
    pub const MAX_COLOR_INDEX: u8 = 32;
}

pub mod api {
    pub const API_PREFIX: &str = "/api/v2";
    pub const CMDB_BRANCH: &str = "cmdb";
    pub const MONITOR_BRANCH: &str = "monitor";
    pub const ADDRESS_PATH: &str = "firewall/address/";
    pub const POLICY_PATH: &str = "firewall/policy/";
    pub const FIRMWARE_PATH: &str = "system/firmware/";
}

pub mod params {
    pub const VDOM: &str = "vdom";
    pub const GLOBAL: &str = "global";
    pub const ACCESS_TOKEN: &str = "access_token";
    pub const FILTER: &str = "filter";
    pub const FORMAT: &str = "format";
    pub const KEY: &str = "key";
    pub const PATTERN: &str = "pattern";
    pub const WITH_META: &str = "with_meta";
    pub const SKIP: &str = "skip";
    pub const START: &str = "start";
    pub const COUNT: &str = "count";
    pub const ACTION: &str = "action";
    pub const ACTION_MOVE: &str = "move";
}

pub mod headers {
    pub const AUTHORIZATION: &str = "Authorization";
    pub const BEARER_PREFIX: &str = "Bearer ";
}

pub mod defaults {
    pub const SCOPE: &str = "root";
    pub const NAME: &str = "fortigate";
}
