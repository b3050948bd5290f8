use crate::core::codec;
use crate::domain::clock::Clock;
use crate::domain::ports::{Entity, Lookup};
use crate::domain::{
    Listing, ListingId, ListingStatus, Message, MessageId, User, UserId, Vehicle, VehicleHistory,
    VehicleId, VehicleStatus,
};
use crate::utils::error::{MarketError, Result};
use crate::utils::validation::{Validate, ValidationRules};
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// 記憶體中的紀錄集合，每種紀錄以 id 為鍵
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    users: BTreeMap<UserId, User>,
    vehicles: BTreeMap<VehicleId, Vehicle>,
    listings: BTreeMap<ListingId, Listing>,
    messages: BTreeMap<MessageId, Message>,
    histories: BTreeMap<VehicleId, VehicleHistory>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CatalogSummary {
    pub users: usize,
    pub vehicles: usize,
    pub listings: usize,
    pub messages: usize,
    pub histories: usize,
}

fn insert_unique<T: Entity>(table: &mut BTreeMap<T::Id, T>, record: T) -> Result<()> {
    let id = record.id().clone();
    if id.to_string().trim().is_empty() {
        return Err(MarketError::validation(T::kind(), "id", "id cannot be empty"));
    }
    if table.contains_key(&id) {
        return Err(MarketError::DuplicateId {
            kind: T::kind().to_string(),
            id: id.to_string(),
        });
    }
    table.insert(id, record);
    Ok(())
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_user(&mut self, user: User) -> Result<()> {
        insert_unique(&mut self.users, user)
    }

    /// 單獨存在的車輛；刊登所擁有的車輛放在刊登裡
    pub fn insert_vehicle(&mut self, vehicle: Vehicle) -> Result<()> {
        if self.listings.values().any(|l| l.vehicle.id == vehicle.id) {
            return Err(MarketError::DuplicateId {
                kind: "vehicle".to_string(),
                id: vehicle.id.to_string(),
            });
        }
        insert_unique(&mut self.vehicles, vehicle)
    }

    pub fn insert_listing(&mut self, listing: Listing) -> Result<()> {
        let vehicle_id = &listing.vehicle.id;
        let owned_elsewhere = self
            .listings
            .values()
            .any(|l| &l.vehicle.id == vehicle_id && l.id != listing.id);
        if !vehicle_id.is_empty() && (owned_elsewhere || self.vehicles.contains_key(vehicle_id)) {
            return Err(MarketError::DuplicateId {
                kind: "vehicle".to_string(),
                id: vehicle_id.to_string(),
            });
        }
        insert_unique(&mut self.listings, listing)
    }

    pub fn insert_message(&mut self, message: Message) -> Result<()> {
        insert_unique(&mut self.messages, message)
    }

    pub fn insert_history(&mut self, history: VehicleHistory) -> Result<()> {
        insert_unique(&mut self.histories, history)
    }

    pub fn users(&self) -> impl Iterator<Item = &User> {
        self.users.values()
    }

    pub fn vehicles(&self) -> impl Iterator<Item = &Vehicle> {
        self.vehicles.values()
    }

    /// Standalone vehicles followed by the vehicles owned by listings.
    pub fn all_vehicles(&self) -> impl Iterator<Item = &Vehicle> {
        self.vehicles
            .values()
            .chain(self.listings.values().map(|l| &l.vehicle))
    }

    pub fn listings(&self) -> impl Iterator<Item = &Listing> {
        self.listings.values()
    }

    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.messages.values()
    }

    pub fn histories(&self) -> impl Iterator<Item = &VehicleHistory> {
        self.histories.values()
    }

    pub fn listing_mut(&mut self, id: &ListingId) -> Option<&mut Listing> {
        self.listings.get_mut(id)
    }

    pub fn history_mut(&mut self, vehicle_id: &VehicleId) -> Option<&mut VehicleHistory> {
        self.histories.get_mut(vehicle_id)
    }

    pub fn summary(&self) -> CatalogSummary {
        CatalogSummary {
            users: self.users.len(),
            vehicles: self.vehicles.len(),
            listings: self.listings.len(),
            messages: self.messages.len(),
            histories: self.histories.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.summary() == CatalogSummary::default()
    }

    pub fn seller_of(&self, listing: &Listing) -> Option<&User> {
        self.users.get(&listing.seller_id)
    }

    pub fn listings_by_seller(&self, seller: &UserId) -> Vec<&Listing> {
        self.listings
            .values()
            .filter(|l| &l.seller_id == seller)
            .collect()
    }

    pub fn active_listings(&self) -> Vec<&Listing> {
        self.listings.values().filter(|l| l.is_active()).collect()
    }

    pub fn history_of(&self, vehicle_id: &VehicleId) -> Option<&VehicleHistory> {
        self.histories.get(vehicle_id)
    }

    /// 兩位使用者針對某刊登的對話，依時間排序（同時間再依 id）
    pub fn conversation(&self, listing: &ListingId, a: &UserId, b: &UserId) -> Vec<&Message> {
        let mut thread: Vec<&Message> = self
            .messages
            .values()
            .filter(|m| &m.listing_id == listing && m.is_between(a, b))
            .collect();
        thread.sort_by(|x, y| x.timestamp.cmp(&y.timestamp).then_with(|| x.id.cmp(&y.id)));
        thread
    }

    pub fn unread_for(&self, user: &UserId) -> Vec<&Message> {
        let mut unread: Vec<&Message> = self
            .messages
            .values()
            .filter(|m| &m.recipient_id == user && !m.read)
            .collect();
        unread.sort_by(|x, y| x.timestamp.cmp(&y.timestamp).then_with(|| x.id.cmp(&y.id)));
        unread
    }

    /// Marks every message `reader` received on `listing` as read. Returns how many changed.
    pub fn mark_conversation_read(&mut self, listing: &ListingId, reader: &UserId) -> usize {
        let mut changed = 0;
        for message in self.messages.values_mut() {
            if &message.listing_id == listing && &message.recipient_id == reader && !message.read {
                message.mark_read();
                changed += 1;
            }
        }
        changed
    }

    /// 從快照文件載入：`{ users, vehicles, listings, messages, histories }`，
    /// 缺少的區段視為空
    pub fn from_document_str(text: &str, clock: &impl Clock) -> Result<Self> {
        let value: Value = serde_json::from_str(text).map_err(|e| MarketError::DecodeError {
            kind: "snapshot".to_string(),
            line: None,
            message: e.to_string(),
        })?;
        let Value::Object(mut sections) = value else {
            return Err(MarketError::DecodeError {
                kind: "snapshot".to_string(),
                line: None,
                message: "expected a JSON object".to_string(),
            });
        };

        let mut catalog = Catalog::new();
        for user in decode_section::<User>(&mut sections, "users", clock)? {
            catalog.insert_user(user)?;
        }
        for vehicle in decode_section::<Vehicle>(&mut sections, "vehicles", clock)? {
            catalog.insert_vehicle(vehicle)?;
        }
        for listing in decode_section::<Listing>(&mut sections, "listings", clock)? {
            catalog.insert_listing(listing)?;
        }
        for message in decode_section::<Message>(&mut sections, "messages", clock)? {
            catalog.insert_message(message)?;
        }
        for history in decode_section::<VehicleHistory>(&mut sections, "histories", clock)? {
            catalog.insert_history(history)?;
        }

        tracing::debug!("Loaded catalog: {:?}", catalog.summary());
        Ok(catalog)
    }

    pub fn to_document_string(&self) -> Result<String> {
        codec::encode_pretty(self)
    }

    pub fn check_integrity(&self, options: &IntegrityOptions) -> IntegrityReport {
        let mut report = IntegrityReport::default();
        let dangling = if options.strict_references {
            IssueSeverity::Error
        } else {
            IssueSeverity::Warning
        };

        for user in self.users.values() {
            if let Err(e) = user.validate() {
                report.push(IssueSeverity::Error, "user", user.id.as_str(), e.to_string());
            }
        }

        // 刊登中的車輛未填賣家時沿用刊登的賣家（舊版 App 只在刊登上記錄賣家）
        let owned = self.listings.values().map(|l| {
            let seller = if l.vehicle.seller_id.is_empty() {
                &l.seller_id
            } else {
                &l.vehicle.seller_id
            };
            (&l.vehicle, seller)
        });
        let standalone = self.vehicles.values().map(|v| (v, &v.seller_id));

        for (vehicle, seller_id) in standalone.chain(owned) {
            if let Err(e) = vehicle.validate_with(&options.rules) {
                report.push(IssueSeverity::Error, "vehicle", vehicle.id.as_str(), e.to_string());
            }
            match self.users.get(seller_id) {
                None => report.push(
                    dangling,
                    "vehicle",
                    vehicle.id.as_str(),
                    format!("seller '{}' does not exist", seller_id),
                ),
                Some(seller) => {
                    if vehicle.published_at < seller.registered_at {
                        report.push(
                            IssueSeverity::Warning,
                            "vehicle",
                            vehicle.id.as_str(),
                            "published before the seller registered",
                        );
                    }
                    if !seller.account_type.can_sell() {
                        report.push(
                            IssueSeverity::Warning,
                            "vehicle",
                            vehicle.id.as_str(),
                            format!("seller '{}' has a {} account", seller.id, seller.account_type),
                        );
                    }
                }
            }
        }

        for listing in self.listings.values() {
            if let Err(e) = Validate::validate(listing) {
                // 車輛錯誤已在上方回報
                if !matches!(&e, MarketError::ValidationError { entity, .. } if entity == "vehicle") {
                    report.push(IssueSeverity::Error, "listing", listing.id.as_str(), e.to_string());
                }
            }
            if !self.users.contains_key(&listing.seller_id) {
                report.push(
                    dangling,
                    "listing",
                    listing.id.as_str(),
                    format!("seller '{}' does not exist", listing.seller_id),
                );
            }
            if !listing.vehicle.seller_id.is_empty() && listing.vehicle.seller_id != listing.seller_id {
                report.push(
                    IssueSeverity::Warning,
                    "listing",
                    listing.id.as_str(),
                    format!(
                        "listing seller '{}' differs from vehicle seller '{}'",
                        listing.seller_id, listing.vehicle.seller_id
                    ),
                );
            }
            if listing.status == ListingStatus::Sold && listing.vehicle.status != VehicleStatus::Sold {
                report.push(
                    IssueSeverity::Warning,
                    "listing",
                    listing.id.as_str(),
                    format!("listing is sold but its vehicle is {}", listing.vehicle.status),
                );
            }
        }

        for message in self.messages.values() {
            if let Err(e) = message.validate() {
                report.push(IssueSeverity::Error, "message", message.id.as_str(), e.to_string());
            }
            for (role, user_id) in [("sender", &message.sender_id), ("recipient", &message.recipient_id)] {
                match self.users.get(user_id) {
                    None => report.push(
                        dangling,
                        "message",
                        message.id.as_str(),
                        format!("{} '{}' does not exist", role, user_id),
                    ),
                    Some(user) if role == "sender" && message.timestamp < user.registered_at => {
                        report.push(
                            IssueSeverity::Warning,
                            "message",
                            message.id.as_str(),
                            "sent before the sender registered",
                        )
                    }
                    Some(_) => {}
                }
            }
            if !self.listings.contains_key(&message.listing_id) {
                report.push(
                    dangling,
                    "message",
                    message.id.as_str(),
                    format!("listing '{}' does not exist", message.listing_id),
                );
            }
        }

        for history in self.histories.values() {
            if let Err(e) = history.validate() {
                report.push(IssueSeverity::Error, "history", history.vehicle_id.as_str(), e.to_string());
            }
            if !Lookup::<Vehicle>::contains(self, &history.vehicle_id) {
                report.push(
                    dangling,
                    "history",
                    history.vehicle_id.as_str(),
                    format!("vehicle '{}' does not exist", history.vehicle_id),
                );
            }
        }

        tracing::debug!(
            "Integrity check: {} errors, {} warnings",
            report.error_count(),
            report.warning_count()
        );
        report
    }
}

fn decode_section<T: Entity>(
    sections: &mut serde_json::Map<String, Value>,
    key: &str,
    clock: &impl Clock,
) -> Result<Vec<T>> {
    match sections.remove(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .into_iter()
            .map(|item| codec::decode_value::<T>(item, clock))
            .collect(),
        Some(_) => Err(MarketError::DecodeError {
            kind: "snapshot".to_string(),
            line: None,
            message: format!("section '{}' must be an array", key),
        }),
    }
}

#[derive(Serialize)]
struct CatalogDocument<'a> {
    users: Vec<&'a User>,
    vehicles: Vec<&'a Vehicle>,
    listings: Vec<&'a Listing>,
    messages: Vec<&'a Message>,
    histories: Vec<&'a VehicleHistory>,
}

impl Serialize for Catalog {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        CatalogDocument {
            users: self.users.values().collect(),
            vehicles: self.vehicles.values().collect(),
            listings: self.listings.values().collect(),
            messages: self.messages.values().collect(),
            histories: self.histories.values().collect(),
        }
        .serialize(serializer)
    }
}

impl Lookup<User> for Catalog {
    fn resolve(&self, id: &UserId) -> Option<&User> {
        self.users.get(id)
    }
}

impl Lookup<Vehicle> for Catalog {
    fn resolve(&self, id: &VehicleId) -> Option<&Vehicle> {
        self.vehicles.get(id).or_else(|| {
            self.listings
                .values()
                .map(|l| &l.vehicle)
                .find(|v| &v.id == id)
        })
    }
}

impl Lookup<Listing> for Catalog {
    fn resolve(&self, id: &ListingId) -> Option<&Listing> {
        self.listings.get(id)
    }
}

impl Lookup<Message> for Catalog {
    fn resolve(&self, id: &MessageId) -> Option<&Message> {
        self.messages.get(id)
    }
}

impl Lookup<VehicleHistory> for Catalog {
    fn resolve(&self, id: &VehicleId) -> Option<&VehicleHistory> {
        self.histories.get(id)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct IntegrityOptions {
    pub rules: ValidationRules,
    /// 懸空參照視為錯誤（否則為警告）
    pub strict_references: bool,
}

impl Default for IntegrityOptions {
    fn default() -> Self {
        Self {
            rules: ValidationRules::default(),
            strict_references: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntegrityIssue {
    pub severity: IssueSeverity,
    pub entity: &'static str,
    pub id: String,
    pub message: String,
}

impl fmt::Display for IntegrityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            IssueSeverity::Warning => "warning",
            IssueSeverity::Error => "error",
        };
        write!(f, "[{}] {} '{}': {}", tag, self.entity, self.id, self.message)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IntegrityReport {
    pub issues: Vec<IntegrityIssue>,
}

impl IntegrityReport {
    fn push(&mut self, severity: IssueSeverity, entity: &'static str, id: &str, message: impl Into<String>) {
        self.issues.push(IntegrityIssue {
            severity,
            entity,
            id: id.to_string(),
            message: message.into(),
        });
    }

    pub fn error_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == IssueSeverity::Error)
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.issues.len() - self.error_count()
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::clock::FixedClock;
    use crate::domain::AccountType;

    const T0: i64 = 1_700_000_000_000;

    fn sample() -> Catalog {
        let clock = FixedClock::from_millis(T0);
        let mut catalog = Catalog::new();
        catalog
            .insert_user(User::new("u1".into(), "Amine", "Ben Salah", AccountType::Seller, &clock))
            .unwrap();
        catalog
            .insert_user(User::new("u2".into(), "Sarra", "Jaziri", AccountType::Buyer, &clock))
            .unwrap();

        let vehicle = Vehicle::new("v1".into(), "u1".into(), "Kia", "Picanto", &clock);
        catalog
            .insert_listing(Listing::new("l1".into(), vehicle, "u1".into()))
            .unwrap();
        catalog.insert_history(VehicleHistory::new("v1".into())).unwrap();

        for (i, (id, from, to)) in [("m2", "u1", "u2"), ("m1", "u2", "u1"), ("m3", "u2", "u1")]
            .iter()
            .enumerate()
        {
            let at = FixedClock::from_millis(T0 + 1_000 * (i as i64 % 2));
            catalog
                .insert_message(Message::new(
                    (*id).into(),
                    (*from).into(),
                    (*to).into(),
                    "l1".into(),
                    "hello",
                    &at,
                ))
                .unwrap();
        }
        catalog
    }

    #[test]
    fn test_duplicate_ids_are_rejected() {
        let clock = FixedClock::from_millis(T0);
        let mut catalog = sample();

        let err = catalog
            .insert_user(User::new("u1".into(), "X", "Y", AccountType::Both, &clock))
            .unwrap_err();
        assert!(matches!(err, MarketError::DuplicateId { ref kind, .. } if kind == "user"));

        let err = catalog.insert_user(User::with_clock(&clock)).unwrap_err();
        assert!(matches!(err, MarketError::ValidationError { .. }));

        // 車輛已屬於刊登 l1
        let err = catalog
            .insert_vehicle(Vehicle::new("v1".into(), "u1".into(), "Kia", "Rio", &clock))
            .unwrap_err();
        assert!(matches!(err, MarketError::DuplicateId { ref kind, .. } if kind == "vehicle"));
    }

    #[test]
    fn test_weak_references_resolve() {
        let catalog = sample();
        let listing = Lookup::<Listing>::resolve(&catalog, &"l1".into()).unwrap();
        assert_eq!(catalog.seller_of(listing).unwrap().first_name, "Amine");
        assert!(Lookup::<Vehicle>::contains(&catalog, &"v1".into()));
        assert!(catalog.history_of(&"v1".into()).is_some());
        assert!(Lookup::<User>::resolve(&catalog, &"ghost".into()).is_none());
        assert_eq!(catalog.listings_by_seller(&"u1".into()).len(), 1);
    }

    #[test]
    fn test_conversation_is_time_ordered() {
        let mut catalog = sample();
        let thread = catalog.conversation(&"l1".into(), &"u1".into(), &"u2".into());
        let ids: Vec<&str> = thread.iter().map(|m| m.id.as_str()).collect();
        // m2 與 m3 同時間，依 id 排序
        assert_eq!(ids, vec!["m2", "m3", "m1"]);

        assert_eq!(catalog.unread_for(&"u1".into()).len(), 2);
        assert_eq!(catalog.mark_conversation_read(&"l1".into(), &"u1".into()), 2);
        assert!(catalog.unread_for(&"u1".into()).is_empty());
    }

    #[test]
    fn test_clean_catalog_has_no_issues() {
        let report = sample().check_integrity(&IntegrityOptions::default());
        assert!(report.is_clean(), "unexpected issues: {:?}", report.issues);
    }

    #[test]
    fn test_integrity_reports_dangling_references() {
        let clock = FixedClock::from_millis(T0);
        let mut catalog = sample();
        catalog
            .insert_message(Message::new(
                "m9".into(),
                "u2".into(),
                "ghost".into(),
                "l404".into(),
                "anyone?",
                &clock,
            ))
            .unwrap();
        catalog.insert_history(VehicleHistory::new("v404".into())).unwrap();

        let report = catalog.check_integrity(&IntegrityOptions::default());
        assert_eq!(report.error_count(), 3);
        assert!(report.issues.iter().any(|i| i.message.contains("recipient 'ghost'")));
        assert!(report.issues.iter().any(|i| i.message.contains("listing 'l404'")));
        assert!(report.issues.iter().any(|i| i.entity == "history" && i.id == "v404"));

        let lenient = IntegrityOptions {
            strict_references: false,
            ..IntegrityOptions::default()
        };
        let report = catalog.check_integrity(&lenient);
        assert!(!report.has_errors());
        assert_eq!(report.warning_count(), 3);
    }

    #[test]
    fn test_integrity_warns_on_sold_listing_with_available_vehicle() {
        let mut catalog = sample();
        let listing = catalog.listing_mut(&"l1".into()).unwrap();
        listing.status = ListingStatus::Sold;

        let report = catalog.check_integrity(&IntegrityOptions::default());
        assert!(!report.has_errors());
        assert!(report.issues[0].message.contains("sold but its vehicle is available"));
    }

    #[test]
    fn test_listing_vehicle_without_seller_uses_listing_seller() {
        let clock = FixedClock::from_millis(T0);
        let mut catalog = sample();
        let vehicle = Vehicle::new("v2".into(), UserId::new(""), "Peugeot", "208", &clock);
        catalog
            .insert_listing(Listing::new("l2".into(), vehicle, "u1".into()))
            .unwrap();

        let report = catalog.check_integrity(&IntegrityOptions::default());
        assert!(report.is_clean(), "unexpected issues: {:?}", report.issues);

        let vehicle = Vehicle::new("v3".into(), UserId::new(""), "Fiat", "Tipo", &clock);
        catalog
            .insert_listing(Listing::new("l3".into(), vehicle, "ghost".into()))
            .unwrap();
        let report = catalog.check_integrity(&IntegrityOptions::default());
        assert!(report
            .issues
            .iter()
            .any(|i| i.entity == "vehicle" && i.id == "v3" && i.message.contains("seller 'ghost'")));
    }

    #[test]
    fn test_integrity_warns_on_events_before_registration() {
        let clock = FixedClock::from_millis(T0);
        let later = FixedClock::from_millis(T0 + 60_000);
        let mut catalog = sample();
        catalog
            .insert_user(User::new("u3".into(), "Nour", "Hamdi", AccountType::Both, &later))
            .unwrap();
        catalog
            .insert_vehicle(Vehicle::new("v7".into(), "u3".into(), "Seat", "Ibiza", &clock))
            .unwrap();
        catalog
            .insert_message(Message::new(
                "m7".into(),
                "u3".into(),
                "u1".into(),
                "l1".into(),
                "still for sale?",
                &clock,
            ))
            .unwrap();

        let report = catalog.check_integrity(&IntegrityOptions::default());
        assert!(!report.has_errors(), "unexpected errors: {:?}", report.issues);
        assert_eq!(report.warning_count(), 2);

        let published = report
            .issues
            .iter()
            .find(|i| i.entity == "vehicle" && i.id == "v7")
            .unwrap();
        assert_eq!(published.severity, IssueSeverity::Warning);
        assert_eq!(published.message, "published before the seller registered");

        let sent = report
            .issues
            .iter()
            .find(|i| i.entity == "message" && i.id == "m7")
            .unwrap();
        assert_eq!(sent.severity, IssueSeverity::Warning);
        assert_eq!(sent.message, "sent before the sender registered");
    }

    #[test]
    fn test_integrity_warns_on_listing_seller_mismatch() {
        let clock = FixedClock::from_millis(T0);
        let mut catalog = sample();
        catalog
            .insert_user(User::new("u3".into(), "Nour", "Hamdi", AccountType::Seller, &clock))
            .unwrap();
        let vehicle = Vehicle::new("v5".into(), "u3".into(), "Toyota", "Yaris", &clock);
        catalog
            .insert_listing(Listing::new("l5".into(), vehicle, "u1".into()))
            .unwrap();

        let report = catalog.check_integrity(&IntegrityOptions::default());
        assert_eq!(report.issues.len(), 1);
        let issue = &report.issues[0];
        assert_eq!(issue.severity, IssueSeverity::Warning);
        assert_eq!(issue.entity, "listing");
        assert_eq!(issue.id, "l5");
        assert!(issue.message.contains("differs from vehicle seller 'u3'"));
    }

    #[test]
    fn test_integrity_rejects_self_addressed_message() {
        let clock = FixedClock::from_millis(T0);
        let mut catalog = sample();
        catalog
            .insert_message(Message::new(
                "m8".into(),
                "u1".into(),
                "u1".into(),
                "l1".into(),
                "note to self",
                &clock,
            ))
            .unwrap();

        let report = catalog.check_integrity(&IntegrityOptions::default());
        assert_eq!(report.error_count(), 1);
        let issue = &report.issues[0];
        assert_eq!(issue.severity, IssueSeverity::Error);
        assert_eq!(issue.id, "m8");
        assert!(issue.message.contains("sender and recipient are the same user"));
    }

    #[test]
    fn test_document_round_trip() {
        let clock = FixedClock::from_millis(T0);
        let catalog = sample();
        let text = catalog.to_document_string().unwrap();
        let loaded = Catalog::from_document_str(&text, &clock).unwrap();
        assert_eq!(loaded, catalog);
    }

    #[test]
    fn test_document_with_missing_sections() {
        let clock = FixedClock::from_millis(T0);
        let catalog = Catalog::from_document_str(r#"{"users": [{"id": "u1"}]}"#, &clock).unwrap();
        assert_eq!(catalog.summary().users, 1);
        assert_eq!(catalog.summary().listings, 0);

        assert!(Catalog::from_document_str(r#"{"users": {}}"#, &clock).is_err());
        assert!(Catalog::from_document_str("[]", &clock).is_err());
    }
}
