// src/report/captions.rs
use crate::processing::indices::IndexKind;

pub fn heading(kind: IndexKind) -> &'static str {
    match kind {
        IndexKind::Ndvi => "NDVI:",
        IndexKind::IronOxide => "Iron Oxide Index:",
        IndexKind::AlOh => "AlOH:",
        IndexKind::Feooh => "FEOOH:",
        IndexKind::Aai => "Clay Alteration Index:",
        IndexKind::Ais => "Argillic and Sericitic Alteration Index:",
        IndexKind::Dos2 => "Deep Contour Iron Oxide Index:",
    }
}

pub fn caption(kind: IndexKind) -> &'static [&'static str] {
    match kind {
        IndexKind::Ndvi => &[
            "NDVI, or Normalized Difference Vegetation Index, is an indicator used to assess the health and density",
            "of vegetation in terrestrial areas from satellite and remote sensing data.",
            "It is commonly used in agriculture, ecology and environmental studies to monitor crop growth, forest health",
            "and vegetation in general. It is especially useful in the early detection of drought, water stress and",
            "changes in vegetation cover.",
        ],
        IndexKind::IronOxide => &[
            "A hyperspectral index used in the analysis of satellite or aerial imagery to identify the presence and",
            "concentration of iron minerals on the earth's surface. These minerals include iron oxides such as hematite",
            "(Fe2O3) and goethite (FeO(OH)), which are important in the mining industry because of their economic value.",
        ],
        IndexKind::AlOh => &[
            "The aluminum hydroxylated (AlOH) absorption index is a hyperspectral index used in satellite or aerial image",
            "analysis to detect the presence and concentration of minerals containing hydroxylated aluminum, such as",
            "kaolinite (a clay mineral) and alunite. These minerals are important in the mining industry and in geological",
            "studies because of their relationship to geological processes and the formation of mineral deposits.",
        ],
        IndexKind::Feooh => &[
            "The Ferric Oxide-Oxyhydroxide Clay Index (FEOOH) is a hyperspectral index used in satellite or airborne image",
            "analysis to detect the presence and concentration of clay minerals containing ferric oxides and oxyhydroxides.",
            "This index is particularly useful for identifying the presence of minerals such as goethite and hematite, which",
            "are common iron minerals present in geological formations.",
        ],
        IndexKind::Aai => &[
            "The Clay Alteration Index is a hyperspectral index used in satellite or airborne image analysis to identify",
            "the presence and concentration of clay minerals in geological formations. Clay minerals are important indicators",
            "of hydrothermal alteration and are often associated with mineral deposits and reservoirs.",
        ],
        IndexKind::Ais => &[
            "The Argillic and Sericite Alteration Index is a hyperspectral index used in satellite or aerial image analysis",
            "to identify the presence and concentration of clay minerals and sericite in geological formations. Both clay",
            "minerals and sericite are indicators of hydrothermal alteration processes and are often associated with mineral",
            "deposits and reservoirs.",
        ],
        IndexKind::Dos2 => &[
            "The Deep Contour Iron Oxide Index is a hyperspectral index used in satellite or airborne image analysis to identify",
            "the presence and concentration of iron oxides in geological formations. Iron oxides, such as hematite and goethite,",
            "are important minerals for industry and can also be indicators of specific geological processes.",
        ],
    }
}
