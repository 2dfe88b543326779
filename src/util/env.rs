//! Environment configuration.
//!
//! Variables are read through [`dotenvy`] (so a local `.env` works) and fed to a small serde
//! deserializer, which lets [`Env`] use the usual `rename_all`/`default` attributes. Values are
//! parsed with [`str::parse`] for numeric and boolean fields.

use std::sync::LazyLock;

use serde::Deserialize;
use serde::de::value::MapDeserializer;
use serde::de::{self, IntoDeserializer};
use thiserror::Error;
use tokio::sync::OnceCell;

static ENV_VARS: LazyLock<OnceCell<Env>> = LazyLock::new(OnceCell::new);

pub async fn get_env() -> EnvResult<&'static Env> {
    ENV_VARS.get_or_try_init(|| async { Env::new() }).await
}

pub async fn get_var(var: Var) -> EnvResult<&'static str> {
    let vars = get_env().await?;
    Ok(match var {
        Var::DatabaseUrl => &vars.database_url,
        Var::ServerApiPort => &vars.server_api_port,
        Var::CorsAllowOrigins => &vars.cors_allow_origins,
    })
}

#[inline]
fn default_port() -> String {
    String::from("3000")
}

#[inline]
fn default_cors() -> String {
    String::from("*")
}

#[inline]
fn default_service_name() -> String {
    String::from("repboard-api")
}

#[inline]
fn default_tracer_name() -> String {
    String::from("repboard-tracer")
}

#[inline]
fn default_log_filter() -> String {
    String::from("repboard_server=debug,tower_http=debug,axum=debug,sqlx=info,info")
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct Env {
    pub database_url: String,
    #[serde(default = "default_port")]
    pub server_api_port: String,
    #[serde(default = "default_cors")]
    pub cors_allow_origins: String,
    #[serde(default = "default_service_name")]
    pub api_service_name: String,
    #[serde(default = "default_tracer_name")]
    pub api_tracer_name: String,
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
    /// Unset means console-only telemetry.
    pub otel_exporter_otlp_endpoint: Option<String>,

    pub vote_allow_self: Option<bool>,
    pub vote_min_rank: Option<i32>,
    pub vote_allow_retract: Option<bool>,
}

impl Env {
    pub fn new() -> EnvResult<Self> {
        Ok(from_env::<Env>()?)
    }
}

#[derive(Debug)]
pub enum Var {
    DatabaseUrl,
    ServerApiPort,
    CorsAllowOrigins,
}

#[macro_export]
macro_rules! var {
    ($ev:expr) => {
        $crate::util::env::get_var($ev)
    };
}

pub fn from_env<T>() -> Result<T, EnvDeserializeError>
where
    T: de::DeserializeOwned,
{
    from_iter(dotenvy::vars())
}

pub fn from_iter<Iter, T>(iter: Iter) -> Result<T, EnvDeserializeError>
where
    T: de::DeserializeOwned,
    Iter: IntoIterator<Item = (String, String)>,
{
    let pairs = iter
        .into_iter()
        .map(|(key, value)| (Key(key.clone()), Value { key, value }));

    T::deserialize(MapDeserializer::new(pairs))
}

// ---
//  Deserializer implementation
// ---

/// Variable name, deserialized as a struct field identifier.
struct Key(String);

/// Variable value, remembering its name for error messages.
struct Value {
    key: String,
    value: String,
}

impl<'de> IntoDeserializer<'de, EnvDeserializeError> for Key {
    type Deserializer = de::value::StringDeserializer<EnvDeserializeError>;

    fn into_deserializer(self) -> Self::Deserializer {
        self.0.into_deserializer()
    }
}

impl<'de> IntoDeserializer<'de, EnvDeserializeError> for Value {
    type Deserializer = Self;

    fn into_deserializer(self) -> Self::Deserializer {
        self
    }
}

macro_rules! parse_scalar {
    ($($ty:ident => $method:ident,)*) => {
        $(
            fn $method<V>(self, visitor: V) -> Result<V::Value, EnvDeserializeError>
            where
                V: de::Visitor<'de>,
            {
                match self.value.trim().parse::<$ty>() {
                    Ok(parsed) => parsed.into_deserializer().$method(visitor),
                    Err(e) => Err(EnvDeserializeError::Invalid {
                        key: self.key,
                        value: self.value,
                        reason: e.to_string(),
                    }),
                }
            }
        )*
    };
}

impl<'de> de::Deserializer<'de> for Value {
    type Error = EnvDeserializeError;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: de::Visitor<'de>,
    {
        self.value.into_deserializer().deserialize_any(visitor)
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: de::Visitor<'de>,
    {
        if self.value.is_empty() {
            visitor.visit_none()
        } else {
            visitor.visit_some(self)
        }
    }

    fn deserialize_newtype_struct<V>(
        self,
        _: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V>(
        self,
        _: &'static str,
        _: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_enum(self.value.into_deserializer())
    }

    parse_scalar! {
        bool => deserialize_bool,
        u8 => deserialize_u8,
        u16 => deserialize_u16,
        u32 => deserialize_u32,
        u64 => deserialize_u64,
        i8 => deserialize_i8,
        i16 => deserialize_i16,
        i32 => deserialize_i32,
        i64 => deserialize_i64,
        f32 => deserialize_f32,
        f64 => deserialize_f64,
    }

    serde::forward_to_deserialize_any! {
        char str string unit bytes byte_buf map seq
        unit_struct tuple_struct identifier tuple
        ignored_any struct
    }
}

impl de::Error for EnvDeserializeError {
    fn custom<T>(msg: T) -> Self
    where
        T: std::fmt::Display,
    {
        EnvDeserializeError::Custom(msg.to_string())
    }

    fn missing_field(field: &'static str) -> Self {
        EnvDeserializeError::MissingValue(field.to_ascii_uppercase())
    }
}

pub type EnvResult<T> = core::result::Result<T, EnvErr>;

#[derive(Debug, Error)]
pub enum EnvErr {
    #[error(transparent)]
    Dotenvy(#[from] dotenvy::Error),

    #[error(transparent)]
    DeserializationError(#[from] EnvDeserializeError),
}

#[derive(Debug, Error, PartialEq)]
pub enum EnvDeserializeError {
    #[error("env deserialization error: {0}")]
    Custom(String),

    #[error("missing required variable {0}")]
    MissingValue(String),

    #[error("invalid value '{value}' for {key}: {reason}")]
    Invalid {
        key: String,
        value: String,
        reason: String,
    },
}
