use crate::core::catalog::Catalog;
use crate::domain::ports::Storage;
use crate::utils::error::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use std::io::Write;
use zip::write::{FileOptions, ZipWriter};

pub const DEFAULT_BUNDLE_NAME: &str = "market_export.zip";

fn timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<Vec<u8>> {
    Ok(writer.into_inner().map_err(|e| e.into_error())?)
}

pub fn users_csv(catalog: &Catalog) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "id",
        "firstName",
        "lastName",
        "email",
        "phone",
        "accountType",
        "profilePhotoUrl",
        "city",
        "registeredAt",
    ])?;
    for user in catalog.users() {
        let row: [&str; 9] = [
            user.id.as_str(),
            &user.first_name,
            &user.last_name,
            &user.email,
            &user.phone,
            user.account_type.as_str(),
            &user.profile_photo_url,
            &user.city,
            &timestamp(&user.registered_at),
        ];
        writer.write_record(row)?;
    }
    finish(writer)
}

/// 包含刊登所擁有的車輛；照片網址以 `|` 串接
pub fn vehicles_csv(catalog: &Catalog) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "id",
        "make",
        "model",
        "year",
        "mileage",
        "price",
        "color",
        "fuelType",
        "transmission",
        "photoUrls",
        "description",
        "sellerId",
        "status",
        "publishedAt",
    ])?;
    for vehicle in catalog.all_vehicles() {
        let row: [&str; 14] = [
            vehicle.id.as_str(),
            &vehicle.make,
            &vehicle.model,
            &vehicle.year.to_string(),
            &vehicle.mileage.to_string(),
            &format!("{:.2}", vehicle.price),
            &vehicle.color,
            &vehicle.fuel_type,
            &vehicle.transmission,
            &vehicle.photo_urls.join("|"),
            &vehicle.description,
            vehicle.seller_id.as_str(),
            vehicle.status.as_str(),
            &timestamp(&vehicle.published_at),
        ];
        writer.write_record(row)?;
    }
    finish(writer)
}

pub fn listings_csv(catalog: &Catalog) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "id",
        "vehicleId",
        "sellerId",
        "title",
        "price",
        "viewCount",
        "favoriteCount",
        "status",
    ])?;
    for listing in catalog.listings() {
        let row: [&str; 8] = [
            listing.id.as_str(),
            listing.vehicle.id.as_str(),
            listing.seller_id.as_str(),
            &listing.vehicle.title(),
            &format!("{:.2}", listing.vehicle.price),
            &listing.view_count.to_string(),
            &listing.favorite_count.to_string(),
            listing.status.as_str(),
        ];
        writer.write_record(row)?;
    }
    finish(writer)
}

pub fn messages_csv(catalog: &Catalog) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "id",
        "senderId",
        "recipientId",
        "listingId",
        "content",
        "timestamp",
        "read",
    ])?;
    for message in catalog.messages() {
        let row: [&str; 7] = [
            message.id.as_str(),
            message.sender_id.as_str(),
            message.recipient_id.as_str(),
            message.listing_id.as_str(),
            &message.content,
            &timestamp(&message.timestamp),
            if message.read { "true" } else { "false" },
        ];
        writer.write_record(row)?;
    }
    finish(writer)
}

/// 將各類紀錄打包成 zip 寫入 storage，回傳檔名
pub async fn export_bundle<S: Storage>(
    catalog: &Catalog,
    storage: &S,
    bundle_name: &str,
) -> Result<String> {
    let histories: Vec<_> = catalog.histories().collect();
    let files: Vec<(&str, Vec<u8>)> = vec![
        ("users.csv", users_csv(catalog)?),
        ("vehicles.csv", vehicles_csv(catalog)?),
        ("listings.csv", listings_csv(catalog)?),
        ("messages.csv", messages_csv(catalog)?),
        (
            "histories.json",
            serde_json::to_string_pretty(&histories)?.into_bytes(),
        ),
    ];

    tracing::debug!("Creating ZIP bundle with {} files", files.len());

    let zip_data = {
        let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
        for (name, data) in &files {
            zip.start_file::<_, ()>(*name, FileOptions::default())?;
            zip.write_all(data)?;
        }
        let cursor = zip.finish()?;
        cursor.into_inner()
    };

    tracing::debug!("Writing ZIP bundle ({} bytes) to storage", zip_data.len());
    storage.write_file(bundle_name, &zip_data).await?;

    tracing::info!("📦 Exported {:?} to {}", catalog.summary(), bundle_name);
    Ok(bundle_name.to_string())
}
