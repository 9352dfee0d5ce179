// ===========================================================================
// Filtre de Bloom en clair — encodage de l'ensemble du détenteur
//
// Construit une seule fois avant chiffrement. Les positions d'un élément
// sont dérivées par SHA-256 ; le même calcul sert côté requêtes, sur le
// filtre chiffré.
// ===========================================================================

use sha2::{Digest, Sha256};

#[derive(Debug, Clone, PartialEq)]
pub struct BloomFilter {
    bits:    Vec<bool>,
    nhashes: usize,
}

impl BloomFilter {
    /// Filtre vide de `size` cases (au moins une) et `nhashes` fonctions de hachage.
    pub fn new(size: usize, nhashes: usize) -> Self {
        BloomFilter {
            bits: vec![false; size.max(1)],
            nhashes: nhashes.max(1),
        }
    }

    /// Dimensionne le filtre pour `capacity` insertions et une probabilité
    /// de faux positif de 2^-fp_log2 : m = 1.44·fp_log2·capacity, k = fp_log2.
    pub fn with_false_positive_log2(fp_log2: u32, capacity: usize) -> Self {
        // 1.44 en centièmes : calcul entier, arrondi supérieur
        let size = (144 * fp_log2 as usize * capacity.max(1) + 99) / 100;
        Self::new(size, fp_log2 as usize)
    }

    /// buildFilter : insère chaque chaîne d'octets dans un filtre dimensionné.
    pub fn build<V: AsRef<[u8]>>(elements: &[V], capacity: usize, fp_log2: u32) -> Self {
        let mut filter = Self::with_false_positive_log2(fp_log2, capacity);
        for e in elements {
            filter.insert(e);
        }
        filter
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn nhashes(&self) -> usize {
        self.nhashes
    }

    pub fn bins(&self) -> &[bool] {
        &self.bits
    }

    /// Nombre de cases à 1
    pub fn weight(&self) -> usize {
        self.bits.iter().filter(|b| **b).count()
    }

    // Case brute (avant réduction modulo la taille) pour la fonction `hash_index`
    fn bin<V: AsRef<[u8]> + ?Sized>(value: &V, hash_index: usize) -> u64 {
        let mut h = Sha256::new();
        h.update((hash_index as u64).to_le_bytes());
        h.update(value.as_ref());
        let digest = h.finalize();
        let mut head = [0u8; 8];
        head.copy_from_slice(&digest[..8]);
        u64::from_le_bytes(head)
    }

    /// Les `nhashes` positions (éventuellement répétées) d'une valeur dans
    /// un filtre de `size` cases. Ne dépend que de la forme du filtre : le
    /// filtre chiffré s'en sert sans disposer des bits en clair.
    pub fn hash_positions<V: AsRef<[u8]> + ?Sized>(value: &V, size: usize, nhashes: usize) -> Vec<usize> {
        let size = size.max(1) as u64;
        (0..nhashes)
            .map(|i| (Self::bin(value, i) % size) as usize)
            .collect()
    }

    pub fn positions<V: AsRef<[u8]> + ?Sized>(&self, value: &V) -> Vec<usize> {
        Self::hash_positions(value, self.len(), self.nhashes)
    }

    pub fn insert<V: AsRef<[u8]> + ?Sized>(&mut self, value: &V) {
        for i in self.positions(value) {
            self.bits[i] = true;
        }
    }

    pub fn contains<V: AsRef<[u8]> + ?Sized>(&self, value: &V) -> bool {
        self.positions(value).into_iter().all(|i| self.bits[i])
    }
}
