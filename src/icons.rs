//! Icon registry: maps stored icon identifiers (`SiReact`, `JavaIcon`, ...)
//! to something the frontend can draw.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Glyph {
    /// Icon from the Simple Icons set.
    SimpleIcon { slug: &'static str },
    /// Static image served by the frontend.
    Image { src: &'static str },
    /// Icon from the Lucide set.
    Lucide { name: &'static str },
    Unknown,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct IconOption {
    pub value: &'static str,
    pub label: &'static str,
    pub glyph: Glyph,
}

const fn simple(value: &'static str, label: &'static str, slug: &'static str) -> IconOption {
    IconOption {
        value,
        label,
        glyph: Glyph::SimpleIcon { slug },
    }
}

pub const CATALOG: &[IconOption] = &[
    simple("SiHtml5", "HTML 5", "html5"),
    simple("SiCss3", "CSS 3", "css3"),
    simple("SiJavascript", "JavaScript", "javascript"),
    simple("SiTypescript", "TypeScript", "typescript"),
    simple("SiReact", "React", "react"),
    simple("SiNextdotjs", "Next.js", "nextdotjs"),
    simple("SiVuedotjs", "Vue.js", "vuedotjs"),
    simple("SiTailwindcss", "Tailwind CSS", "tailwindcss"),
    simple("SiNodedotjs", "Node.js", "nodedotjs"),
    simple("SiExpress", "Express", "express"),
    IconOption {
        value: "JavaIcon",
        label: "Java (Custom)",
        glyph: Glyph::Image { src: "/java.png" },
    },
    simple("SiPhp", "PHP", "php"),
    simple("SiDotnet", ".NET Core", "dotnet"),
    simple("SiMongodb", "MongoDB", "mongodb"),
    simple("SiPostgresql", "PostgreSQL", "postgresql"),
    simple("SiMysql", "MySQL", "mysql"),
    simple("SiRedis", "Redis", "redis"),
    simple("SiWordpress", "WordPress", "wordpress"),
    simple("SiShopify", "Shopify", "shopify"),
    simple("SiSupabase", "Supabase", "supabase"),
    simple("SiGit", "Git", "git"),
    simple("SiDocker", "Docker", "docker"),
    simple("SiFigma", "Figma", "figma"),
    simple("SiAccuweather", "Accuweather", "accuweather"),
    IconOption {
        value: "SeoIcon",
        label: "SEO",
        glyph: Glyph::Lucide { name: "search" },
    },
];

static REGISTRY: Lazy<HashMap<&'static str, Glyph>> =
    Lazy::new(|| CATALOG.iter().map(|icon| (icon.value, icon.glyph)).collect());

/// Glyph for a stored identifier; missing or unknown identifiers render as `Unknown`.
pub fn resolve(value: Option<&str>) -> Glyph {
    value
        .map(str::trim)
        .and_then(|v| REGISTRY.get(v).copied())
        .unwrap_or(Glyph::Unknown)
}
