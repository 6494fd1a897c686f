//! CAD input fixtures
//!
//! The fake engine never parses its inputs; fixtures only need to exist
//! with a supported extension.

use std::path::{Path, PathBuf};

/// Minimal STEP text with the given product names
#[derive(Debug, Clone, Default)]
pub struct CadFixture {
    pub products: Vec<String>,
}

impl CadFixture {
    pub fn with_products(products: &[&str]) -> Self {
        Self {
            products: products.iter().map(|p| p.to_string()).collect(),
        }
    }

    pub fn to_step_text(&self) -> String {
        let mut text = String::from("ISO-10303-21;\nHEADER;\nENDSEC;\nDATA;\n");
        for (i, product) in self.products.iter().enumerate() {
            text.push_str(&format!(
                "#{}=PRODUCT('{}','','',(#1));\n",
                i + 10,
                product.replace('\'', "''")
            ));
        }
        text.push_str("ENDSEC;\nEND-ISO-10303-21;\n");
        text
    }

    pub fn write(&self, path: &Path) -> PathBuf {
        std::fs::write(path, self.to_step_text()).unwrap();
        path.to_path_buf()
    }
}

/// Write one fixture per name into `dir`, returning the paths in order
pub fn write_cad_files(dir: &Path, names: &[&str]) -> Vec<PathBuf> {
    names
        .iter()
        .map(|name| CadFixture::default().write(&dir.join(name)))
        .collect()
}
