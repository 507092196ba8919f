//! WATOS Code Page Compiler
//!
//! Generates binary code page files from character encoding definitions

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

/// Binary code page file format:
/// - Magic: "CPAG" (4 bytes)
/// - Version: 1 (1 byte)
/// - Code page ID: u16 (2 bytes, little-endian)
/// - Name length (1 byte)
/// - Name (variable, max 32 bytes)
/// - Byte-to-Unicode map: 256 * 4 bytes (UTF-32 LE) = 1024 bytes
const MAGIC: &[u8; 4] = b"CPAG";
const VERSION: u8 = 1;

struct CodePage {
    id: u16,
    name: String,
    byte_to_unicode: [char; 256],
}

impl CodePage {
    fn new(id: u16, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            byte_to_unicode: ['\0'; 256],
        }
    }

    fn set(&mut self, byte: u8, ch: char) {
        self.byte_to_unicode[byte as usize] = ch;
    }

    fn write_to_file(&self, path: &Path) -> std::io::Result<()> {
        let mut file = File::create(path)?;

        // Write header
        file.write_all(MAGIC)?;
        file.write_all(&[VERSION])?;
        file.write_all(&self.id.to_le_bytes())?;

        let name_bytes = self.name.as_bytes();
        let name_len = name_bytes.len().min(32) as u8;
        file.write_all(&[name_len])?;
        file.write_all(&name_bytes[..name_len as usize])?;

        // Write byte-to-unicode map (256 * 4 bytes UTF-32 LE)
        for ch in &self.byte_to_unicode {
            file.write_all(&(*ch as u32).to_le_bytes())?;
        }

        Ok(())
    }
}

fn build_cp437() -> CodePage {
    let mut cp = CodePage::new(437, "CP437");

    // ASCII (0-127) maps directly
    for i in 0..128 {
        cp.set(i, i as char);
    }

    // Extended ASCII (128-255) - IBM PC original
    let extended: &[(u8, char)] = &[
        (128, '√З'), (129, '√Љ'), (130, '√©'), (131, '√Ґ'),
        (132, '√§'), (133, '√†'), (134, '√•'), (135, '√І'),
        (136, '√™'), (137, '√Ђ'), (138, '√®'), (139, '√ѓ'),
        (140, '√Ѓ'), (141, '√ђ'), (142, '√Д'), (143, '√Е'),
        (144, '√Й'), (145, '√¶'), (146, '√Ж'), (147, '√і'),
        (148, '√ґ'), (149, '√≤'), (150, '√ї'), (151, '√є'),
        (152, '√њ'), (153, '√Ц'), (154, '√Ь'), (155, '¬Ґ'),
        (156, '¬£'), (157, '¬•'), (158, 'вВІ'), (159, '∆Т'),
        (160, '√°'), (161, '√≠'), (162, '√≥'), (163, '√Ї'),
        (164, '√±'), (165, '√С'), (166, '¬™'), (167, '¬Ї'),
        (168, '¬њ'), (169, 'вМР'), (170, '¬ђ'), (171, '¬љ'),
        (172, '¬Љ'), (173, '¬°'), (174, '¬Ђ'), (175, '¬ї'),
        (176, 'вЦС'), (177, 'вЦТ'), (178, 'вЦУ'), (179, 'вФВ'),
        (180, 'вФ§'), (181, 'вХ°'), (182, 'вХҐ'), (183, 'вХЦ'),
        (184, 'вХХ'), (185, 'вХ£'), (186, 'вХС'), (187, 'вХЧ'),
        (188, 'вХЭ'), (189, 'вХЬ'), (190, 'вХЫ'), (191, 'вФР'),
        (192, 'вФФ'), (193, 'вФі'), (194, 'вФђ'), (195, 'вФЬ'),
        (196, 'вФА'), (197, 'вФЉ'), (198, 'вХЮ'), (199, 'вХЯ'),
        (200, 'вХЪ'), (201, 'вХФ'), (202, 'вХ©'), (203, 'вХ¶'),
        (204, 'вХ†'), (205, 'вХР'), (206, 'вХђ'), (207, 'вХІ'),
        (208, 'вХ®'), (209, 'вХ§'), (210, 'вХ•'), (211, 'вХЩ'),
        (212, 'вХШ'), (213, 'вХТ'), (214, 'вХУ'), (215, 'вХЂ'),
        (216, 'вХ™'), (217, 'вФШ'), (218, 'вФМ'), (219, 'вЦИ'),
        (220, 'вЦД'), (221, 'вЦМ'), (222, 'вЦР'), (223, 'вЦА'),
        (224, 'ќ±'), (225, '√Я'), (226, 'ќУ'), (227, 'ѕА'),
        (228, 'ќ£'), (229, 'ѕГ'), (230, '¬µ'), (231, 'ѕД'),
        (232, 'ќ¶'), (233, 'ќШ'), (234, 'ќ©'), (235, 'ќі'),
        (236, 'вИЮ'), (237, 'ѕЖ'), (238, 'ќµ'), (239, 'вИ©'),
        (240, 'вЙ°'), (241, '¬±'), (242, 'вЙ•'), (243, 'вЙ§'),
        (244, 'вМ†'), (245, 'вМ°'), (246, '√Ј'), (247, 'вЙИ'),
        (248, '¬∞'), (249, 'вИЩ'), (250, '¬Ј'), (251, 'вИЪ'),
        (252, 'вБњ'), (253, '¬≤'), (254, 'вЦ†'), (255, ' '),
    ];

    for &(byte, ch) in extended {
        cp.set(byte, ch);
    }

    cp
}

fn build_cp850() -> CodePage {
    let mut cp = CodePage::new(850, "CP850");

    // ASCII (0-127) maps directly
    for i in 0..128 {
        cp.set(i, i as char);
    }

    // Extended ASCII (128-255) - Multilingual Latin 1
    let extended: &[(u8, char)] = &[
        (128, '√З'), (129, '√Љ'), (130, '√©'), (131, '√Ґ'),
        (132, '√§'), (133, '√†'), (134, '√•'), (135, '√І'),
        (136, '√™'), (137, '√Ђ'), (138, '√®'), (139, '√ѓ'),
        (140, '√Ѓ'), (141, '√ђ'), (142, '√Д'), (143, '√Е'),
        (144, '√Й'), (145, '√¶'), (146, '√Ж'), (147, '√і'),
        (148, '√ґ'), (149, '√≤'), (150, '√ї'), (151, '√є'),
        (152, '√њ'), (153, '√Ц'), (154, '√Ь'), (155, '√Є'),
        (156, '¬£'), (157, '√Ш'), (158, '√Ч'), (159, '∆Т'),
        (160, '√°'), (161, '√≠'), (162, '√≥'), (163, '√Ї'),
        (164, '√±'), (165, '√С'), (166, '¬™'), (167, '¬Ї'),
        (168, '¬њ'), (169, '¬Ѓ'), (170, '¬ђ'), (171, '¬љ'),
        (172, '¬Љ'), (173, '¬°'), (174, '¬Ђ'), (175, '¬ї'),
        (176, 'вЦС'), (177, 'вЦТ'), (178, 'вЦУ'), (179, 'вФВ'),
        (180, 'вФ§'), (181, '√Б'), (182, '√В'), (183, '√А'),
        (184, '¬©'), (185, 'вХ£'), (186, 'вХС'), (187, 'вХЧ'),
        (188, 'вХЭ'), (189, '¬Ґ'), (190, '¬•'), (191, 'вФР'),
        (192, 'вФФ'), (193, 'вФі'), (194, 'вФђ'), (195, 'вФЬ'),
        (196, 'вФА'), (197, 'вФЉ'), (198, '√£'), (199, '√Г'),
        (200, 'вХЪ'), (201, 'вХФ'), (202, 'вХ©'), (203, 'вХ¶'),
        (204, 'вХ†'), (205, 'вХР'), (206, 'вХђ'), (207, '¬§'),
        (208, '√∞'), (209, '√Р'), (210, '√К'), (211, '√Л'),
        (212, '√И'), (213, 'ƒ±'), (214, '√Н'), (215, '√О'),
        (216, '√П'), (217, 'вФШ'), (218, 'вФМ'), (219, 'вЦИ'),
        (220, 'вЦД'), (221, '¬¶'), (222, '√М'), (223, 'вЦА'),
        (224, '√У'), (225, '√Я'), (226, '√Ф'), (227, '√Т'),
        (228, '√µ'), (229, '√Х'), (230, '¬µ'), (231, '√Њ'),
        (232, '√Ю'), (233, '√Ъ'), (234, '√Ы'), (235, '√Щ'),
        (236, '√љ'), (237, '√Э'), (238, '¬ѓ'), (239, '¬і'),
        (240, '¬≠'), (241, '¬±'), (242, 'вАЧ'), (243, '¬Њ'),
        (244, '¬ґ'), (245, '¬І'), (246, '√Ј'), (247, '¬Є'),
        (248, '¬∞'), (249, '¬®'), (250, '¬Ј'), (251, '¬є'),
        (252, '¬≥'), (253, '¬≤'), (254, 'вЦ†'), (255, ' '),
    ];

    for &(byte, ch) in extended {
        cp.set(byte, ch);
    }

    cp
}

fn build_cp1252() -> CodePage {
    let mut cp = CodePage::new(1252, "CP1252");

    // ASCII and Latin-1 (0-127, 160-255) map directly
    for i in 0..128 {
        cp.set(i, i as char);
    }
    for i in 160..=255 {
        cp.set(i, i as char);
    }

    // Windows-1252 specific (128-159)
    let windows_chars: &[(u8, char)] = &[
        (128, 'вВђ'), (130, 'вАЪ'), (131, '∆Т'), (132, 'вАЮ'),
        (133, 'вА¶'), (134, 'вА†'), (135, 'вА°'), (136, 'ЋЖ'),
        (137, 'вА∞'), (138, '≈†'), (139, 'вАє'), (140, '≈Т'),
        (142, '≈љ'), (145, '\u{2018}'), (146, '\u{2019}'), (147, '"'),
        (148, '"'), (149, 'вАҐ'), (150, 'вАУ'), (151, 'вАФ'),
        (152, 'ЋЬ'), (153, 'вДҐ'), (154, '≈°'), (155, 'вАЇ'),
        (156, '≈У'), (158, '≈Њ'), (159, '≈Є'),
    ];

    for &(byte, ch) in windows_chars {
        cp.set(byte, ch);
    }

    // Undefined characters in Windows-1252 (129, 141, 143, 144, 157)
    cp.set(129, '?');
    cp.set(141, '?');
    cp.set(143, '?');
    cp.set(144, '?');
    cp.set(157, '?');

    cp
}

fn main() {
    let output_dir = Path::new("rootfs/system/codepages");

    // Create output directory
    fs::create_dir_all(output_dir).expect("Failed to create codepage directory");

    println!("Building code pages...");

    // Build and save code pages
    let codepages = vec![
        build_cp437(),
        build_cp850(),
        build_cp1252(),
    ];

    for cp in codepages {
        let filename = format!("cp{}.cpg", cp.id);
        let path = output_dir.join(&filename);

        cp.write_to_file(&path).expect(&format!("Failed to write {}", filename));
        println!("  Created: {}", path.display());
    }

    println!("Code pages compiled successfully!");
}
