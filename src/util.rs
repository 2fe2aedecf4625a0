use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

fn env_or<T: FromStr + Copy>(key: &str, default: T) -> T {
    parse_or(std::env::var(key).ok(), default)
}

fn parse_or<T: FromStr + Copy>(value: Option<String>, default: T) -> T {
    value.map_or(default, |res| res.trim().parse().unwrap_or(default))
}

const HUB_PORT: &str = "SENSOR_HUB_PORT";

const DEFAULT_PORT: u16 = 8080;

pub fn get_port() -> u16 {
    env_or(HUB_PORT, DEFAULT_PORT)
}

const HUB_ADDR: &str = "SENSOR_HUB_ADDR";

const DEFAULT_ADDR: IpAddr = IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0));

pub fn get_addr() -> IpAddr {
    env_or(HUB_ADDR, DEFAULT_ADDR)
}

pub fn get_bind_addr() -> SocketAddr {
    SocketAddr::new(get_addr(), get_port())
}

const DB_PATH: &str = "SENSOR_DB_PATH";

const DEFAULT_DB_PATH: &str = "./readings.db";

pub fn get_db_path() -> PathBuf {
    std::env::var(DB_PATH).map_or(PathBuf::from(DEFAULT_DB_PATH), PathBuf::from)
}

const HUB_URL: &str = "SENSOR_HUB_URL";

const DEFAULT_HUB_URL: &str = "http://127.0.0.1:8080";

pub fn get_hub_url() -> String {
    std::env::var(HUB_URL).unwrap_or_else(|_| DEFAULT_HUB_URL.to_string())
}
