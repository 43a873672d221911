use time::Date;

/// One metering point as listed by the customer API, flattened.
///
/// Written wholesale on every full sync and otherwise immutable.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MeterInfo {
    #[sqlx(rename = "meteringPointId")]
    pub metering_point_id: String,
    #[sqlx(rename = "typeOfMP")]
    pub type_of_mp: Option<String>,
    #[sqlx(rename = "streetName")]
    pub street_name: Option<String>,
    #[sqlx(rename = "buildingNumber")]
    pub building_number: Option<String>,
    #[sqlx(rename = "floorId")]
    pub floor_id: Option<String>,
    #[sqlx(rename = "roomId")]
    pub room_id: Option<String>,
    pub postcode: Option<String>,
    #[sqlx(rename = "cityName")]
    pub city_name: Option<String>,
    /// Date the consumer took over the metering point; the backfill
    /// start boundary before clamping to the earliest supported date.
    #[sqlx(rename = "consumerStartDate")]
    pub consumer_start_date: Date,
}
