use crate::domain::clock::Clock;
use crate::domain::ids::{ListingId, MessageId, UserId, VehicleId};
use crate::domain::ports::{Entity, Schema};
use crate::domain::status::{AccidentSeverity, AccountType, ListingStatus, VehicleStatus};
use crate::utils::error::{MarketError, Result};
use crate::utils::validation::{
    validate_email, validate_non_empty_string, validate_optional_url, validate_range,
    validate_url, Validate, ValidationRules,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default)]
    pub id: UserId,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub account_type: AccountType,
    #[serde(default)]
    pub profile_photo_url: String,
    #[serde(default)]
    pub city: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub registered_at: DateTime<Utc>,
}

const USER_SCHEMA: Schema = Schema {
    kind: "user",
    legacy_keys: &[
        ("prenom", "firstName"),
        ("nom", "lastName"),
        ("telephone", "phone"),
        ("typeCompte", "accountType"),
        ("photoProfilUrl", "profilePhotoUrl"),
        ("ville", "city"),
        ("dateInscription", "registeredAt"),
    ],
    timestamps: &["registeredAt"],
    embedded_refs: &[],
    blank_as_absent: &["accountType"],
    nested: &[],
};

impl User {
    /// 以預設值建立帳號，註冊時間取自 `clock`
    pub fn with_clock(clock: &impl Clock) -> Self {
        Self {
            id: UserId::default(),
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            phone: String::new(),
            account_type: AccountType::default(),
            profile_photo_url: String::new(),
            city: String::new(),
            registered_at: clock.now(),
        }
    }

    pub fn new(
        id: UserId,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        account_type: AccountType,
        clock: &impl Clock,
    ) -> Self {
        Self {
            id,
            first_name: first_name.into(),
            last_name: last_name.into(),
            account_type,
            ..Self::with_clock(clock)
        }
    }

    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

impl Entity for User {
    type Id = UserId;
    const SCHEMA: &'static Schema = &USER_SCHEMA;

    fn id(&self) -> &UserId {
        &self.id
    }
}

impl Validate for User {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("user", "id", self.id.as_str())?;
        if !self.email.is_empty() {
            validate_email("user", "email", &self.email)?;
        }
        validate_optional_url("user", "profilePhotoUrl", &self.profile_photo_url)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Vehicle
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    #[serde(default)]
    pub id: VehicleId,
    #[serde(default)]
    pub make: String,
    #[serde(default)]
    pub model: String,
    /// 0 表示未填
    #[serde(default)]
    pub year: i32,
    #[serde(default)]
    pub mileage: u32,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub fuel_type: String,
    #[serde(default)]
    pub transmission: String,
    #[serde(default)]
    pub photo_urls: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub seller_id: UserId,
    #[serde(default)]
    pub status: VehicleStatus,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub published_at: DateTime<Utc>,
}

const VEHICLE_SCHEMA: Schema = Schema {
    kind: "vehicle",
    legacy_keys: &[
        ("marque", "make"),
        ("modele", "model"),
        ("annee", "year"),
        ("kilometrage", "mileage"),
        ("prix", "price"),
        ("couleur", "color"),
        ("carburant", "fuelType"),
        ("photosUrls", "photoUrls"),
        ("vendeurId", "sellerId"),
        ("statut", "status"),
        ("datePublication", "publishedAt"),
    ],
    timestamps: &["publishedAt"],
    embedded_refs: &[],
    blank_as_absent: &["status"],
    nested: &[],
};

impl Vehicle {
    pub fn with_clock(clock: &impl Clock) -> Self {
        Self {
            id: VehicleId::default(),
            make: String::new(),
            model: String::new(),
            year: 0,
            mileage: 0,
            price: 0.0,
            color: String::new(),
            fuel_type: String::new(),
            transmission: String::new(),
            photo_urls: Vec::new(),
            description: String::new(),
            seller_id: UserId::default(),
            status: VehicleStatus::default(),
            published_at: clock.now(),
        }
    }

    pub fn new(
        id: VehicleId,
        seller_id: UserId,
        make: impl Into<String>,
        model: impl Into<String>,
        clock: &impl Clock,
    ) -> Self {
        Self {
            id,
            seller_id,
            make: make.into(),
            model: model.into(),
            ..Self::with_clock(clock)
        }
    }

    pub fn title(&self) -> String {
        let mut title = format!("{} {}", self.make, self.model).trim().to_string();
        if self.year > 0 {
            title.push_str(&format!(" ({})", self.year));
        }
        title
    }

    pub fn cover_photo(&self) -> Option<&str> {
        self.photo_urls.first().map(String::as_str)
    }

    pub fn validate_with(&self, rules: &ValidationRules) -> Result<()> {
        validate_non_empty_string("vehicle", "id", self.id.as_str())?;
        if self.year != 0 {
            validate_range("vehicle", "year", self.year, rules.min_year, rules.max_year)?;
        }
        validate_range("vehicle", "mileage", self.mileage, 0, rules.max_mileage)?;
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(MarketError::validation(
                "vehicle",
                "price",
                format!("price must be a non-negative amount, got {}", self.price),
            ));
        }
        for url in &self.photo_urls {
            validate_url("vehicle", "photoUrls", url)?;
        }
        Ok(())
    }
}

impl Entity for Vehicle {
    type Id = VehicleId;
    const SCHEMA: &'static Schema = &VEHICLE_SCHEMA;

    fn id(&self) -> &VehicleId {
        &self.id
    }
}

impl Validate for Vehicle {
    fn validate(&self) -> Result<()> {
        self.validate_with(&ValidationRules::default())
    }
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

/// 刊登：擁有一台車輛，賣家僅以 id 參照
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    #[serde(default)]
    pub id: ListingId,
    pub vehicle: Vehicle,
    #[serde(default)]
    pub seller_id: UserId,
    #[serde(default)]
    pub view_count: u32,
    #[serde(default)]
    pub favorite_count: u32,
    #[serde(default)]
    pub status: ListingStatus,
}

const LISTING_SCHEMA: Schema = Schema {
    kind: "listing",
    legacy_keys: &[
        ("vehicule", "vehicle"),
        ("nbVues", "viewCount"),
        ("nbFavoris", "favoriteCount"),
        ("statut", "status"),
    ],
    timestamps: &[],
    embedded_refs: &[("vendeur", "sellerId"), ("seller", "sellerId")],
    blank_as_absent: &["status"],
    nested: &[("vehicle", &VEHICLE_SCHEMA)],
};

impl Listing {
    pub fn new(id: ListingId, vehicle: Vehicle, seller_id: UserId) -> Self {
        Self {
            id,
            vehicle,
            seller_id,
            view_count: 0,
            favorite_count: 0,
            status: ListingStatus::default(),
        }
    }

    pub fn record_view(&mut self) {
        self.view_count = self.view_count.saturating_add(1);
    }

    pub fn record_favorite(&mut self) {
        self.favorite_count = self.favorite_count.saturating_add(1);
    }

    pub fn remove_favorite(&mut self) {
        self.favorite_count = self.favorite_count.saturating_sub(1);
    }

    pub fn is_active(&self) -> bool {
        self.status == ListingStatus::Active
    }

    /// 狀態轉換；已售出的刊登不可再變更
    pub fn set_status(&mut self, to: ListingStatus) -> Result<()> {
        if self.status == to {
            return Ok(());
        }
        if self.status.is_final() {
            return Err(MarketError::InvalidTransition {
                from: self.status.to_string(),
                to: to.to_string(),
            });
        }
        tracing::debug!("Listing {} status {} -> {}", self.id, self.status, to);
        self.status = to;
        match to {
            ListingStatus::Sold => self.vehicle.status = VehicleStatus::Sold,
            ListingStatus::Active if self.vehicle.status == VehicleStatus::Withdrawn => {
                self.vehicle.status = VehicleStatus::Available
            }
            _ => {}
        }
        Ok(())
    }

    pub fn mark_sold(&mut self) -> Result<()> {
        self.set_status(ListingStatus::Sold)
    }

    pub fn expire(&mut self) -> Result<()> {
        self.set_status(ListingStatus::Expired)
    }

    pub fn validate_with(&self, rules: &ValidationRules) -> Result<()> {
        validate_non_empty_string("listing", "id", self.id.as_str())?;
        self.vehicle.validate_with(rules)
    }
}

impl Entity for Listing {
    type Id = ListingId;
    const SCHEMA: &'static Schema = &LISTING_SCHEMA;

    fn id(&self) -> &ListingId {
        &self.id
    }
}

impl Validate for Listing {
    fn validate(&self) -> Result<()> {
        self.validate_with(&ValidationRules::default())
    }
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(default)]
    pub id: MessageId,
    #[serde(default)]
    pub sender_id: UserId,
    #[serde(default)]
    pub recipient_id: UserId,
    #[serde(default)]
    pub listing_id: ListingId,
    #[serde(default)]
    pub content: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub read: bool,
}

const MESSAGE_SCHEMA: Schema = Schema {
    kind: "message",
    legacy_keys: &[
        ("expediteurId", "senderId"),
        ("destinataireId", "recipientId"),
        ("annonceId", "listingId"),
        ("contenu", "content"),
        ("lu", "read"),
    ],
    timestamps: &["timestamp"],
    embedded_refs: &[],
    blank_as_absent: &[],
    nested: &[],
};

impl Message {
    pub fn with_clock(clock: &impl Clock) -> Self {
        Self {
            id: MessageId::default(),
            sender_id: UserId::default(),
            recipient_id: UserId::default(),
            listing_id: ListingId::default(),
            content: String::new(),
            timestamp: clock.now(),
            read: false,
        }
    }

    pub fn new(
        id: MessageId,
        sender_id: UserId,
        recipient_id: UserId,
        listing_id: ListingId,
        content: impl Into<String>,
        clock: &impl Clock,
    ) -> Self {
        Self {
            id,
            sender_id,
            recipient_id,
            listing_id,
            content: content.into(),
            ..Self::with_clock(clock)
        }
    }

    pub fn mark_read(&mut self) {
        self.read = true;
    }

    /// 是否屬於兩位使用者之間的對話（不分方向）
    pub fn is_between(&self, a: &UserId, b: &UserId) -> bool {
        (&self.sender_id == a && &self.recipient_id == b)
            || (&self.sender_id == b && &self.recipient_id == a)
    }
}

impl Entity for Message {
    type Id = MessageId;
    const SCHEMA: &'static Schema = &MESSAGE_SCHEMA;

    fn id(&self) -> &MessageId {
        &self.id
    }
}

impl Validate for Message {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("message", "id", self.id.as_str())?;
        validate_non_empty_string("message", "content", &self.content)?;
        if !self.sender_id.is_empty() && self.sender_id == self.recipient_id {
            return Err(MarketError::validation(
                "message",
                "recipientId",
                "sender and recipient are the same user",
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Vehicle history
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceEvent {
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub mileage: u32,
    /// e.g. "oil change", "timing belt"
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub cost: f64,
    #[serde(default)]
    pub garage: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Repair {
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub mileage: u32,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub cost: f64,
    #[serde(default)]
    pub garage: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Accident {
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub severity: AccidentSeverity,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub repaired_at: Option<DateTime<Utc>>,
}

/// 車輛履歷，以車輛 id 為鍵；各序列依發生順序保存
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleHistory {
    #[serde(default)]
    pub vehicle_id: VehicleId,
    #[serde(default)]
    pub maintenance: Vec<MaintenanceEvent>,
    #[serde(default)]
    pub repairs: Vec<Repair>,
    #[serde(default)]
    pub accidents: Vec<Accident>,
}

const HISTORY_SCHEMA: Schema = Schema {
    kind: "history",
    legacy_keys: &[
        ("vehiculeId", "vehicleId"),
        ("entretiens", "maintenance"),
        ("reparations", "repairs"),
    ],
    timestamps: &[],
    embedded_refs: &[],
    blank_as_absent: &[],
    nested: &[],
};

impl VehicleHistory {
    pub fn new(vehicle_id: VehicleId) -> Self {
        Self {
            vehicle_id,
            ..Self::default()
        }
    }

    pub fn record_maintenance(&mut self, event: MaintenanceEvent) {
        self.maintenance.push(event);
    }

    pub fn record_repair(&mut self, repair: Repair) {
        self.repairs.push(repair);
    }

    pub fn record_accident(&mut self, accident: Accident) {
        self.accidents.push(accident);
    }

    pub fn is_accident_free(&self) -> bool {
        self.accidents.is_empty()
    }

    pub fn total_cost(&self) -> f64 {
        self.maintenance.iter().map(|m| m.cost).sum::<f64>()
            + self.repairs.iter().map(|r| r.cost).sum::<f64>()
    }
}

impl Entity for VehicleHistory {
    type Id = VehicleId;
    const SCHEMA: &'static Schema = &HISTORY_SCHEMA;

    fn id(&self) -> &VehicleId {
        &self.vehicle_id
    }
}

impl Validate for VehicleHistory {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("history", "vehicleId", self.vehicle_id.as_str())?;
        let costs = self
            .maintenance
            .iter()
            .map(|m| m.cost)
            .chain(self.repairs.iter().map(|r| r.cost));
        for cost in costs {
            if !cost.is_finite() || cost < 0.0 {
                return Err(MarketError::validation(
                    "history",
                    "cost",
                    format!("cost must be a non-negative amount, got {}", cost),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::clock::FixedClock;

    const T0: i64 = 1_700_000_000_000;

    fn clock() -> FixedClock {
        FixedClock::from_millis(T0)
    }

    #[test]
    fn test_default_construction() {
        let clock = clock();

        let user = User::with_clock(&clock);
        assert!(user.id.is_empty());
        assert_eq!(user.email, "");
        assert_eq!(user.account_type, AccountType::Buyer);
        assert_eq!(user.registered_at.timestamp_millis(), T0);

        let vehicle = Vehicle::with_clock(&clock);
        assert_eq!(vehicle.year, 0);
        assert_eq!(vehicle.mileage, 0);
        assert_eq!(vehicle.price, 0.0);
        assert!(vehicle.photo_urls.is_empty());
        assert_eq!(vehicle.status, VehicleStatus::Available);
        assert_eq!(vehicle.published_at.timestamp_millis(), T0);

        let message = Message::with_clock(&clock);
        assert!(!message.read);
        assert_eq!(message.content, "");
        assert_eq!(message.timestamp.timestamp_millis(), T0);

        let history = VehicleHistory::default();
        assert!(history.maintenance.is_empty());
        assert!(history.repairs.is_empty());
        assert!(history.accidents.is_empty());

        let listing = Listing::new(ListingId::new("l1"), vehicle, UserId::new("u1"));
        assert_eq!(listing.view_count, 0);
        assert_eq!(listing.favorite_count, 0);
        assert_eq!(listing.status, ListingStatus::Active);
    }

    #[test]
    fn test_listing_counters() {
        let mut listing = Listing::new(
            ListingId::new("l1"),
            Vehicle::with_clock(&clock()),
            UserId::new("u1"),
        );
        listing.record_view();
        listing.record_view();
        listing.record_favorite();
        listing.remove_favorite();
        listing.remove_favorite();
        assert_eq!(listing.view_count, 2);
        assert_eq!(listing.favorite_count, 0);
    }

    #[test]
    fn test_sold_listing_is_final() {
        let mut listing = Listing::new(
            ListingId::new("l1"),
            Vehicle::with_clock(&clock()),
            UserId::new("u1"),
        );
        listing.expire().unwrap();
        assert_eq!(listing.status, ListingStatus::Expired);

        listing.set_status(ListingStatus::Active).unwrap();
        listing.mark_sold().unwrap();
        assert_eq!(listing.vehicle.status, VehicleStatus::Sold);

        let err = listing.expire().unwrap_err();
        assert!(matches!(err, MarketError::InvalidTransition { .. }));
        assert!(listing.mark_sold().is_ok());
    }

    #[test]
    fn test_history_keeps_order() {
        let mut history = VehicleHistory::new(VehicleId::new("v1"));
        for (i, kind) in ["oil change", "brakes", "tyres"].iter().enumerate() {
            history.record_maintenance(MaintenanceEvent {
                date: FixedClock::from_millis(T0 + i as i64).now(),
                mileage: 10_000 * (i as u32 + 1),
                kind: kind.to_string(),
                description: String::new(),
                cost: 100.0,
                garage: String::new(),
            });
        }
        let kinds: Vec<&str> = history.maintenance.iter().map(|m| m.kind.as_str()).collect();
        assert_eq!(kinds, vec!["oil change", "brakes", "tyres"]);
        assert_eq!(history.total_cost(), 300.0);
        assert!(history.is_accident_free());
    }

    #[test]
    fn test_vehicle_validation() {
        let clock = clock();
        let mut vehicle = Vehicle::new(
            VehicleId::new("v1"),
            UserId::new("u1"),
            "Peugeot",
            "208",
            &clock,
        );
        vehicle.year = 2019;
        vehicle.price = 42_000.0;
        vehicle.photo_urls = vec!["https://cdn.example.com/v1/front.jpg".to_string()];
        assert!(vehicle.validate().is_ok());
        assert_eq!(vehicle.title(), "Peugeot 208 (2019)");

        vehicle.year = 1500;
        assert!(vehicle.validate().is_err());

        vehicle.year = 2019;
        vehicle.price = -1.0;
        assert!(vehicle.validate().is_err());

        vehicle.price = 1.0;
        vehicle.photo_urls.push("file:///tmp/x.jpg".to_string());
        assert!(vehicle.validate().is_err());
    }

    #[test]
    fn test_message_validation() {
        let clock = clock();
        let mut message = Message::new(
            MessageId::new("m1"),
            UserId::new("u1"),
            UserId::new("u2"),
            ListingId::new("l1"),
            "Is it still available?",
            &clock,
        );
        assert!(message.validate().is_ok());
        assert!(message.is_between(&UserId::new("u2"), &UserId::new("u1")));

        message.recipient_id = UserId::new("u1");
        assert!(message.validate().is_err());
    }

    #[test]
    fn test_user_validation() {
        let clock = clock();
        let mut user = User::new(UserId::new("u1"), "Amine", "Ben Salah", AccountType::Both, &clock);
        assert_eq!(user.display_name(), "Amine Ben Salah");
        assert!(user.validate().is_ok());

        user.email = "not-an-email".to_string();
        assert!(user.validate().is_err());
    }
}
