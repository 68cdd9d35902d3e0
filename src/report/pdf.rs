//! PDF serialization
//!
//! Writes a [`Layout`] out as a PDF using the standard Helvetica font and an
//! optional RGB image XObject. Content streams are left uncompressed.

use image::{DynamicImage, GenericImageView};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

use super::layout::{Element, Layout, PAGE_HEIGHT, PAGE_WIDTH};
use super::ReportError;

/// Largest pixel size kept for the embedded image (twice the display box)
const MAX_IMAGE_WIDTH: u32 = 1000;
const MAX_IMAGE_HEIGHT: u32 = 600;

const FONT_NAME: &str = "F1";
const IMAGE_NAME: &str = "Im1";

/// Decoded image ready for embedding as 8-bit DeviceRGB
#[derive(Debug, Clone)]
pub struct EmbeddedImage {
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
}

impl EmbeddedImage {
    /// Decode any format the `image` crate understands, downscale large
    /// images, and flatten transparency onto white.
    pub fn decode(bytes: &[u8]) -> Result<Self, ReportError> {
        let mut img = image::load_from_memory(bytes)?;

        let (width, height) = img.dimensions();
        if width > MAX_IMAGE_WIDTH || height > MAX_IMAGE_HEIGHT {
            img = img.resize(
                MAX_IMAGE_WIDTH,
                MAX_IMAGE_HEIGHT,
                image::imageops::FilterType::Triangle,
            );
        }

        let (width, height) = img.dimensions();
        Ok(Self {
            width,
            height,
            rgb: flatten_rgb(&img),
        })
    }
}

fn flatten_rgb(img: &DynamicImage) -> Vec<u8> {
    if !img.color().has_alpha() {
        return img.to_rgb8().into_raw();
    }

    let rgba = img.to_rgba8();
    let mut out = Vec::with_capacity((rgba.width() * rgba.height() * 3) as usize);
    for pixel in rgba.pixels() {
        let [r, g, b, a] = pixel.0;
        let alpha = a as u32;
        for channel in [r, g, b] {
            let blended = (channel as u32 * alpha + 255 * (255 - alpha)) / 255;
            out.push(blended as u8);
        }
    }
    out
}

/// Serialize the laid-out pages into PDF bytes
pub fn render(layout: &Layout, title: &str, image: Option<EmbeddedImage>) -> Result<Vec<u8>, ReportError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });

    let mut resources = dictionary! {
        "Font" => dictionary! {
            FONT_NAME => font_id,
        },
    };

    if let Some(image) = image {
        let image_stream = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => image.width as i64,
                "Height" => image.height as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
            },
            image.rgb,
        );
        let image_id = doc.add_object(image_stream);
        resources.set(
            "XObject",
            dictionary! {
                IMAGE_NAME => image_id,
            },
        );
    }
    let resources_id = doc.add_object(resources);

    let mut kids: Vec<Object> = Vec::with_capacity(layout.pages.len());
    for page in &layout.pages {
        let content = Content {
            operations: page_operations(page),
        };
        let encoded = content
            .encode()
            .map_err(|e| ReportError::Render(format!("Failed to encode page content: {}", e)))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    let media_box: Vec<Object> = vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()];
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => count,
        "Resources" => resources_id,
        "MediaBox" => media_box,
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let info_id = doc.add_object(dictionary! {
        "Title" => Object::string_literal(encode_win_ansi(title)),
        "Producer" => Object::string_literal(concat!("verdant-server ", env!("CARGO_PKG_VERSION"))),
    });
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| ReportError::Render(format!("Failed to serialize PDF: {}", e)))?;

    Ok(buffer)
}

fn page_operations(elements: &[Element]) -> Vec<Operation> {
    let mut ops = Vec::new();

    for element in elements {
        match element {
            Element::Text { x, y, size, text } => {
                ops.push(Operation::new("BT", vec![]));
                ops.push(Operation::new("Tf", vec![FONT_NAME.into(), (*size).into()]));
                ops.push(Operation::new("Td", vec![(*x).into(), (*y).into()]));
                ops.push(Operation::new(
                    "Tj",
                    vec![Object::string_literal(encode_win_ansi(text))],
                ));
                ops.push(Operation::new("ET", vec![]));
            }
            Element::Image {
                x,
                y,
                width,
                height,
            } => {
                ops.push(Operation::new("q", vec![]));
                ops.push(Operation::new(
                    "cm",
                    vec![
                        (*width).into(),
                        0.into(),
                        0.into(),
                        (*height).into(),
                        (*x).into(),
                        (*y).into(),
                    ],
                ));
                ops.push(Operation::new("Do", vec![IMAGE_NAME.into()]));
                ops.push(Operation::new("Q", vec![]));
            }
        }
    }

    ops
}

/// Map text onto WinAnsiEncoding bytes; unmappable characters become `?`
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\u{20}'..='\u{7e}' => c as u8,
            '\u{a0}'..='\u{ff}' => c as u32 as u8,
            '\t' => b' ',
            '\u{20ac}' => 0x80,
            '\u{2026}' => 0x85,
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201c}' => 0x93,
            '\u{201d}' => 0x94,
            '\u{2022}' => 0x95,
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            '\u{2122}' => 0x99,
            _ => b'?',
        })
        .collect()
}
