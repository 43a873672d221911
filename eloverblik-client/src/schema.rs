//! Shared schema descriptor for the eloverblik store.
//!
//! The write side (sync-service) and the read side (this crate's query
//! helpers) both consume these definitions, so table and column names
//! cannot drift apart silently.

pub const METER_INFO_TABLE: &str = "meterinfo";
pub const CONSUMPTION_TABLE: &str = "consumption";
pub const TARIFFS_TABLE: &str = "current_tariffs";

/// Columns of `consumption`, in insert order.
pub const CONSUMPTION_COLUMNS: &str = "meterid, date, kwh";

/// Columns of `meterinfo`, in insert order.
pub const METER_INFO_COLUMNS: &str = "meteringPointId, typeOfMP, streetName, \
     buildingNumber, floorId, roomId, postcode, cityName, consumerStartDate";

/// Columns of `current_tariffs`, in insert order.
pub const TARIFFS_COLUMNS: &str =
    "meterid, name, description, owner, periodType, position, price";

/// SQLite has no DECIMAL type; kWh quantities are stored as REAL and
/// rounded to two decimals at presentation time.
pub const CONSUMPTION_DDL: &str = "CREATE TABLE consumption (\
     meterid TEXT NOT NULL, \
     date TEXT NOT NULL, \
     kwh REAL NOT NULL, \
     PRIMARY KEY (meterid, date))";

pub const METER_INFO_DDL: &str = "CREATE TABLE meterinfo (\
     meteringPointId TEXT NOT NULL PRIMARY KEY, \
     typeOfMP TEXT, \
     streetName TEXT, \
     buildingNumber TEXT, \
     floorId TEXT, \
     roomId TEXT, \
     postcode TEXT, \
     cityName TEXT, \
     consumerStartDate TEXT NOT NULL)";

pub const TARIFFS_DDL: &str = "CREATE TABLE current_tariffs (\
     meterid TEXT NOT NULL, \
     name TEXT NOT NULL, \
     description TEXT, \
     owner TEXT, \
     periodType TEXT, \
     position INTEGER NOT NULL, \
     price REAL NOT NULL)";
