//! Общие константы формата SLOB (header, bins, лимиты) и умолчания.

// -------- Header --------
// Формат (BE):
// [magic u64][uuid_hi u64][uuid_lo u64][encoding tinytext][compression tinytext]
// [tag_count u8]{key tinytext, value tinytext}*
// [content_type_count u8]{type text}*
// [blob_count u32][store_offset u64][size u64]
// [ref_count u32][ref_offset u64]*  -> refs относительно конца таблицы
pub const SLOB_MAGIC: u64 = 0x212d_3153_4c4f_421f; // "!-1SLOB\x1f"

// UUID, которым помечаются файлы, записанные этим крейтом.
// При чтении UUID сохраняется, но не проверяется.
pub const FORMAT_UUID_HI: u64 = 4_862_287_655_031_097_909;
pub const FORMAT_UUID_LO: u64 = 11_718_617_693_102_973_101;

// -------- Framing limits --------
pub const TINY_TEXT_MAX: usize = u8::MAX as usize;
pub const TEXT_MAX: usize = u16::MAX as usize;
pub const BIG_TEXT_MAX: usize = i32::MAX as usize;

// -------- Bins (store items) --------
/// Не более 32767 записей в одном bin.
pub const DEFAULT_MAX_BIN_ITEMS: usize = 32_767;
/// Мягкий лимит на суммарную длину контента bin'а (байты UTF-8).
pub const DEFAULT_MAX_BIN_BYTES: usize = 320 * 1024;
/// item_index хранится как u16.
pub const MAX_ITEMS_PER_BIN_FORMAT: usize = u16::MAX as usize + 1;

// -------- Open strategy --------
/// Файлы больше порога открываются file-backed.
pub const DEFAULT_FILE_BACKED_THRESHOLD: u64 = 128 * 1024 * 1024;

// -------- Compression --------
pub const DEFAULT_ZLIB_LEVEL: u32 = 6;

/// lzma: формат не хранит полный LZMA-заголовок; dictionary size синтезируется
/// из фиксированного показателя.
pub const LZMA_DICT_EXPONENT_BYTE: u32 = 30;
/// Префикс перед сырыми LZMA-данными; props-байт лежит последним.
pub const LZMA_PREFIX_LEN: usize = 6;

/// Подставляется вместо элемента, который не удалось дочитать из хвоста lzma-потока.
pub const DEGRADED_CONTENT: &str =
    "Content is not available because lzma decompression reached the end of the stream before the position where the content was supposed to be";

// -------- Collation --------
pub const COLLATION_LOCALE: &str = "en-US";

// -------- Suggestions --------
pub const DEFAULT_SUGGESTION_LIMIT: usize = 100;
/// Предварительная аллокация для LCS (как у исходного просмотрщика: 255x255).
pub const LCS_PREALLOCATE: usize = 255;

// -------- StarDict --------
pub const STARDICT_DEFAULT_CONTENT_TYPE: &str = "text/html";
