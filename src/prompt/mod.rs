use crate::wire::Issue;

fn design_rules() -> &'static str {
    r#"Design Rules:
- Canvas size: always 1080x1080 pixels, declared on the root <svg> element.
- Layout: centered content; testimonial text inside a clearly bounded container
  (rounded rectangle, circle, or similar) that fully encloses it.
- Typography: sans-serif (Arial, Open Sans, Poppins) or serif (Georgia,
  Playfair Display); 36-48px body text, 80-120px titles; center with
  text-anchor="middle"; break lines with tspan and 50-60px dy steps.
- Color: two-tone schemes with strong contrast between text and background.
  Good pairings: beige/terracotta, teal/cream, white/soft pink, yellow/white.
- Structure: background rect first, then containers, then text, then
  decorative accents (quote marks, stars, separators). Keep the markup clean.
- Every element must stay inside the canvas; no clipped or overflowing text."#
}

fn issue_schema() -> &'static str {
    r#"Report format: a single JSON array, no markdown fences, no prose before
or after. Each element has exactly these fields:
  {"severity": "low" | "medium" | "high",
   "category": "<short area label, e.g. alignment, contrast, overflow>",
   "description": "<what is wrong and where>",
   "suggested_fix": "<the concrete SVG change that fixes it>"}
Return [] when the design has no defects worth fixing."#
}

pub fn system_prompt_enhance() -> String {
    r#"You are a prompt enhancement assistant for an SVG design generator.

Rewrite the user's short request into a structured, visually rich brief while
keeping the original intent. Extract the key elements (background, container
shape, layout, color, typography), make the visual structure explicit, and
specify color harmony and hierarchy the way a designer briefing a colleague
would. Stay concise; do not produce any SVG markup."#
        .to_string()
}

pub fn system_prompt_describe() -> String {
    format!(
        r#"You are a layout description generator for SVG testimonial cards.

Turn the design brief into a detailed prose specification an SVG author could
implement directly. Cover, in order: the overall theme and background; the
title text with exact x/y coordinates and font styling; the testimonial
container with coordinates, dimensions and corner radii; the testimonial text
with coordinates, font family/size/color and line spacing; decorative
elements; and the client name and designation placement. Give concrete pixel
values for every position and size. Do not emit SVG markup.

{}"#,
        design_rules()
    )
}

pub fn system_prompt_svg() -> String {
    format!(
        r#"You are an SVG code generator for testimonial cards.

Convert the layout description into one complete SVG document. Follow the
description's coordinates and styling exactly where given and fill gaps with
sensible defaults. Reply with the SVG document; any surrounding explanation
is ignored, but the markup itself must be complete and well-formed.

{}"#,
        design_rules()
    )
}

pub fn system_prompt_critique() -> String {
    format!(
        r#"You are a visual reviewer for SVG testimonial cards. You receive the
SVG source and the rendered 1080x1080 PNG of the card.

Inspect the image as a person would, then cross-check against the source.
Look for: text misaligned inside or overflowing its container; distorted,
missing or overlapping container shapes; stray unintended shapes; font sizes
or contrast that hurt readability; unbalanced spacing; wrong x/y/width/height
values; missing text-anchor; broken tspan line spacing; fill/stroke/opacity
mistakes; clipPath accidents.

{}"#,
        issue_schema()
    )
}

pub fn system_prompt_critique_strict() -> String {
    format!(
        r#"STRICT MODE: your previous report did not parse. You are a visual
reviewer for SVG testimonial cards receiving SVG source plus the rendered
1080x1080 PNG. Output the defect report again, and this time emit ONLY the
JSON array itself: first character '[', last character ']'.

{}"#,
        issue_schema()
    )
}

pub fn system_prompt_repair() -> String {
    format!(
        r#"You are an SVG repair assistant. You receive a testimonial card's SVG
source, its rendered 1080x1080 PNG, and a reviewed list of defects.

Apply every fix while preserving the design's intent and everything that was
not flagged. Keep the markup clean and well-formed. Reply with the complete
corrected SVG document; partial snippets are useless.

{}"#,
        design_rules()
    )
}

pub fn user_prompt_critique(svg_source: &str) -> String {
    format!(
        "SVG source of the card shown in the attached rendering:\n\n{svg_source}"
    )
}

pub fn user_prompt_repair(svg_source: &str, issues: &[Issue]) -> String {
    let mut listing = String::new();
    for (i, issue) in issues.iter().enumerate() {
        listing.push_str(&format!(
            "{}. [{:?}] {}: {} Fix: {}\n",
            i + 1,
            issue.severity,
            issue.category,
            issue.description,
            issue.suggested_fix
        ));
    }
    format!(
        "SVG source of the card shown in the attached rendering:\n\n{svg_source}\n\nDefects to fix:\n{listing}"
    )
}
