/// Product display name, used as the de facto record identifier for selection.
/// Examples: `Widget`, `Commercial LED Panels`
pub type ProductName = String;
/// Spreadsheet column header text.
/// Examples: `Product Name`, `Cold Email - Sequence 3`
pub type ColumnName = String;
/// Raw key in the persistence store.
/// Examples: `records:LMP`, `selectedId:BMP`, `activeNamespace`
pub type StoreKey = String;
/// Curriculum lesson identifier.
/// Examples: `day1-intro`, `day3-coaching`
pub type LessonId = String;
/// User-facing notice text.
/// Examples: `Loaded 12 products`, `Failed to load shared data. Ask trainer to resend link.`
pub type NoticeText = String;
